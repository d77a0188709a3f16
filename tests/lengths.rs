use strand::{config::Config, context::Context, reports::Report};

mod lengths {
    use super::*;

    #[test]
    fn length_contradiction() {
        // |x| = 3 and x = "ab".
        let mut ctx = Context::from_config(Config::default());
        let x = ctx.seq_var("x");
        let len_x = ctx.terms.length(x);
        let three = ctx.terms.int(3);
        let ab = ctx.terms.const_str("ab");

        let len_is_three = ctx.terms.eq(len_x, three);
        ctx.assert_term(len_is_three, true);
        let x_is_ab = ctx.terms.eq(x, ab);
        ctx.assert_term(x_is_ab, true);

        assert_eq!(ctx.solve(), Ok(Report::Unsatisfiable));
    }

    #[test]
    fn pinned_length_expands() {
        let mut ctx = Context::from_config(Config::default());
        let x = ctx.seq_var("x");
        let len_x = ctx.terms.length(x);
        let two = ctx.terms.int(2);
        let eq = ctx.terms.eq(len_x, two);
        ctx.assert_term(eq, true);

        assert_eq!(ctx.solve(), Ok(Report::Satisfiable));
        let value = ctx.seq_value(x).expect("a witness");
        assert_eq!(value.chars().count(), 2);
        assert!(ctx.counters.fixed_length >= 1);
    }

    #[test]
    fn zero_length_is_empty() {
        let mut ctx = Context::from_config(Config::default());
        let x = ctx.seq_var("x");
        let len_x = ctx.terms.length(x);
        let zero = ctx.terms.int(0);
        let eq = ctx.terms.eq(len_x, zero);
        ctx.assert_term(eq, true);

        assert_eq!(ctx.solve(), Ok(Report::Satisfiable));
        assert_eq!(ctx.seq_value(x).as_deref(), Some(""));
    }

    #[test]
    fn negative_length_is_unsatisfiable() {
        let mut ctx = Context::from_config(Config::default());
        let x = ctx.seq_var("x");
        let len_x = ctx.terms.length(x);
        let minus_one = ctx.terms.int(-1);
        let eq = ctx.terms.eq(len_x, minus_one);
        ctx.assert_term(eq, true);

        assert_eq!(ctx.solve(), Ok(Report::Unsatisfiable));
    }

    #[test]
    fn lengths_add_over_concat() {
        // |x ++ "ab"| = 2 forces x = ε.
        let mut ctx = Context::from_config(Config::default());
        let x = ctx.seq_var("x");
        let ab = ctx.terms.const_str("ab");
        let xab = ctx.terms.concat(&[x, ab]);
        let len = ctx.terms.length(xab);
        let two = ctx.terms.int(2);
        let eq = ctx.terms.eq(len, two);
        ctx.assert_term(eq, true);

        assert_eq!(ctx.solve(), Ok(Report::Satisfiable));
        assert_eq!(ctx.seq_value(x).as_deref(), Some(""));
    }

    #[test]
    fn fixed_elements_distinguish() {
        // |x| = 1, |y| = 1, x ≠ y: the witnesses must differ.
        let mut ctx = Context::from_config(Config::default());
        let x = ctx.seq_var("x");
        let y = ctx.seq_var("y");
        let one = ctx.terms.int(1);
        let len_x = ctx.terms.length(x);
        let len_y = ctx.terms.length(y);

        let lx = ctx.terms.eq(len_x, one);
        ctx.assert_term(lx, true);
        let ly = ctx.terms.eq(len_y, one);
        ctx.assert_term(ly, true);
        let same = ctx.terms.eq(x, y);
        ctx.assert_term(same, false);

        assert_eq!(ctx.solve(), Ok(Report::Satisfiable));
        let vx = ctx.seq_value(x).expect("a witness");
        let vy = ctx.seq_value(y).expect("a witness");
        assert_eq!(vx.chars().count(), 1);
        assert_eq!(vy.chars().count(), 1);
        assert_ne!(vx, vy);
    }
}
