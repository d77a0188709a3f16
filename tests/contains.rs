use strand::{config::Config, context::Context, reports::Report};

mod contains {
    use super::*;

    #[test]
    fn negative_containment_with_exclusions() {
        // ¬contains("abab", x), |x| = 2, x ≠ "ab", x ≠ "ba".
        let mut ctx = Context::from_config(Config::default());
        let x = ctx.seq_var("x");
        let abab = ctx.terms.const_str("abab");

        let within = ctx.terms.contains(abab, x);
        ctx.assert_term(within, false);

        let len_x = ctx.terms.length(x);
        let two = ctx.terms.int(2);
        let len_eq = ctx.terms.eq(len_x, two);
        ctx.assert_term(len_eq, true);

        let ab = ctx.terms.const_str("ab");
        let ba = ctx.terms.const_str("ba");
        let is_ab = ctx.terms.eq(x, ab);
        ctx.assert_term(is_ab, false);
        let is_ba = ctx.terms.eq(x, ba);
        ctx.assert_term(is_ba, false);

        assert_eq!(ctx.solve(), Ok(Report::Satisfiable));
        let value = ctx.seq_value(x).expect("a witness");
        assert_eq!(value.chars().count(), 2);
        assert_ne!(value, "ab");
        assert_ne!(value, "ba");
        assert!(!"abab".contains(&value));
    }

    #[test]
    fn negative_containment_exhausted() {
        // ¬contains("ab", x) with |x| = 2 leaves only x ≠ "ab"; adding x = "ab" closes
        // the space.
        let mut ctx = Context::from_config(Config::default());
        let x = ctx.seq_var("x");
        let ab = ctx.terms.const_str("ab");

        let within = ctx.terms.contains(ab, x);
        ctx.assert_term(within, false);

        let is_ab = ctx.terms.eq(x, ab);
        ctx.assert_term(is_ab, true);

        assert_eq!(ctx.solve(), Ok(Report::Unsatisfiable));
    }

    #[test]
    fn positive_containment_decomposes() {
        // contains("abc", x) with |x| = 2.
        let mut ctx = Context::from_config(Config::default());
        let x = ctx.seq_var("x");
        let abc = ctx.terms.const_str("abc");

        let within = ctx.terms.contains(abc, x);
        ctx.assert_term(within, true);

        let len_x = ctx.terms.length(x);
        let two = ctx.terms.int(2);
        let len_eq = ctx.terms.eq(len_x, two);
        ctx.assert_term(len_eq, true);

        assert_eq!(ctx.solve(), Ok(Report::Satisfiable));
        let value = ctx.seq_value(x).expect("a witness");
        assert_eq!(value.chars().count(), 2);
        assert!("abc".contains(&value));
    }

    #[test]
    fn needle_longer_than_hay_holds_outright() {
        // ¬contains("a", x) with |x| = 2 is trivially satisfied.
        let mut ctx = Context::from_config(Config::default());
        let x = ctx.seq_var("x");
        let a = ctx.terms.const_str("a");

        let within = ctx.terms.contains(a, x);
        ctx.assert_term(within, false);

        let len_x = ctx.terms.length(x);
        let two = ctx.terms.int(2);
        let len_eq = ctx.terms.eq(len_x, two);
        ctx.assert_term(len_eq, true);

        assert_eq!(ctx.solve(), Ok(Report::Satisfiable));
        let value = ctx.seq_value(x).expect("a witness");
        assert_eq!(value.chars().count(), 2);
    }

    #[test]
    fn prefix_forces_shape() {
        // prefixof("ab", y) with |y| = 3.
        let mut ctx = Context::from_config(Config::default());
        let y = ctx.seq_var("y");
        let ab = ctx.terms.const_str("ab");

        let prefix = ctx.terms.prefix_of(ab, y);
        ctx.assert_term(prefix, true);

        let len_y = ctx.terms.length(y);
        let three = ctx.terms.int(3);
        let len_eq = ctx.terms.eq(len_y, three);
        ctx.assert_term(len_eq, true);

        assert_eq!(ctx.solve(), Ok(Report::Satisfiable));
        let value = ctx.seq_value(y).expect("a witness");
        assert_eq!(value.chars().count(), 3);
        assert!(value.starts_with("ab"));
    }
}
