use strand::{
    config::Config,
    context::Context,
    reports::Report,
    types::err::{ErrorKind, RegexError},
};

mod regexes {
    use super::*;

    #[test]
    fn odd_length_language_rejects_even_member() {
        // x ∈ (ab)*c has only odd lengths; |x| = 2 closes the space.
        let mut ctx = Context::from_config(Config::default());
        let x = ctx.seq_var("x");
        let ab = ctx.terms.re_literal("ab");
        let star = ctx.terms.re_star(ab);
        let c = ctx.terms.re_literal("c");
        let re = ctx.terms.re_concat(star, c);

        let member = ctx.terms.in_re(x, re);
        ctx.assert_term(member, true);

        let len_x = ctx.terms.length(x);
        let two = ctx.terms.int(2);
        let len_eq = ctx.terms.eq(len_x, two);
        ctx.assert_term(len_eq, true);

        assert_eq!(ctx.solve(), Ok(Report::Unsatisfiable));
    }

    #[test]
    fn membership_with_pinned_length() {
        // x ∈ (a|b)*c with |x| = 2 is satisfied by "ac" or "bc".
        let mut ctx = Context::from_config(Config::default());
        let x = ctx.seq_var("x");
        let a = ctx.terms.re_literal("a");
        let b = ctx.terms.re_literal("b");
        let u = ctx.terms.re_union(a, b);
        let star = ctx.terms.re_star(u);
        let c = ctx.terms.re_literal("c");
        let re = ctx.terms.re_concat(star, c);

        let member = ctx.terms.in_re(x, re);
        ctx.assert_term(member, true);

        let len_x = ctx.terms.length(x);
        let two = ctx.terms.int(2);
        let len_eq = ctx.terms.eq(len_x, two);
        ctx.assert_term(len_eq, true);

        assert_eq!(ctx.solve(), Ok(Report::Satisfiable));
        let value = ctx.seq_value(x).expect("a witness");
        let chars = value.chars().collect::<Vec<_>>();
        assert_eq!(chars.len(), 2);
        assert!(chars[0] == 'a' || chars[0] == 'b');
        assert_eq!(chars[1], 'c');
        assert!(ctx.counters.propagate_automata > 0);
    }

    #[test]
    fn empty_intersection_conflicts() {
        // a ∩ b is the empty language.
        let mut ctx = Context::from_config(Config::default());
        let x = ctx.seq_var("x");
        let a = ctx.terms.re_literal("a");
        let b = ctx.terms.re_literal("b");
        let re = ctx.terms.re_inter(a, b);

        let member = ctx.terms.in_re(x, re);
        ctx.assert_term(member, true);

        assert_eq!(ctx.solve(), Ok(Report::Unsatisfiable));
    }

    #[test]
    fn negative_membership_through_complement() {
        // x ∉ (a|b)* with |x| = 1: the single element avoids both letters.
        let mut ctx = Context::from_config(Config::default());
        let x = ctx.seq_var("x");
        let a = ctx.terms.re_literal("a");
        let b = ctx.terms.re_literal("b");
        let u = ctx.terms.re_union(a, b);
        let star = ctx.terms.re_star(u);

        let member = ctx.terms.in_re(x, star);
        ctx.assert_term(member, false);

        let len_x = ctx.terms.length(x);
        let one = ctx.terms.int(1);
        let len_eq = ctx.terms.eq(len_x, one);
        ctx.assert_term(len_eq, true);

        assert_eq!(ctx.solve(), Ok(Report::Satisfiable));
        let value = ctx.seq_value(x).expect("a witness");
        let chars = value.chars().collect::<Vec<_>>();
        assert_eq!(chars.len(), 1);
        assert!(chars[0] != 'a' && chars[0] != 'b');
    }

    #[test]
    fn literal_membership_closes_to_equality() {
        let mut ctx = Context::from_config(Config::default());
        let x = ctx.seq_var("x");
        let re = ctx.terms.re_literal("ab");

        let member = ctx.terms.in_re(x, re);
        ctx.assert_term(member, true);

        assert_eq!(ctx.solve(), Ok(Report::Satisfiable));
        assert_eq!(ctx.seq_value(x).as_deref(), Some("ab"));
    }

    #[test]
    fn uncompilable_regex_is_reported() {
        // A sequence variable in regex position has no automaton.
        let mut ctx = Context::from_config(Config::default());
        let x = ctx.seq_var("x");
        let bogus = ctx.seq_var("r");
        let member = ctx.terms.in_re(x, bogus);
        ctx.assert_term(member, true);

        assert!(matches!(
            ctx.solve(),
            Err(ErrorKind::Regex(RegexError::Unsupported(_))),
        ));
    }
}
