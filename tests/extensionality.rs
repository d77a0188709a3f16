use strand::{config::Config, context::Context, reports::Report};

mod extensionality {
    use super::*;

    #[test]
    fn elementwise_equal_sequences_merge() {
        // |x| = |y| = 2 with nth(x, i) = nth(y, i) for i < 2: x = y is derivable.
        let mut ctx = Context::from_config(Config::default());
        let x = ctx.seq_var("x");
        let y = ctx.seq_var("y");
        let two = ctx.terms.int(2);

        let len_x = ctx.terms.length(x);
        let lx = ctx.terms.eq(len_x, two);
        ctx.assert_term(lx, true);
        let len_y = ctx.terms.length(y);
        let ly = ctx.terms.eq(len_y, two);
        ctx.assert_term(ly, true);

        for at in 0..2 {
            let nx = ctx.terms.nth_i(x, at);
            let ny = ctx.terms.nth_i(y, at);
            let eq = ctx.terms.eq(nx, ny);
            ctx.assert_term(eq, true);
        }

        assert_eq!(ctx.solve(), Ok(Report::Satisfiable));

        // The probe put the pair into one class, and the witnesses coincide.
        assert!(ctx.counters.extensionality >= 1);
        assert!(ctx.egraph.are_eq(x, y));
        let vx = ctx.seq_value(x).expect("a witness");
        let vy = ctx.seq_value(y).expect("a witness");
        assert_eq!(vx, vy);
        assert_eq!(vx.chars().count(), 2);
    }

    #[test]
    fn excluded_pairs_are_not_probed() {
        // x = "ab" and y = "cd" are refutably distinct: no probe, and both witness
        // their constants.
        let mut ctx = Context::from_config(Config::default());
        let x = ctx.seq_var("x");
        let y = ctx.seq_var("y");
        let ab = ctx.terms.const_str("ab");
        let cd = ctx.terms.const_str("cd");

        let ex = ctx.terms.eq(x, ab);
        ctx.assert_term(ex, true);
        let ey = ctx.terms.eq(y, cd);
        ctx.assert_term(ey, true);

        assert_eq!(ctx.solve(), Ok(Report::Satisfiable));
        assert_eq!(ctx.counters.extensionality, 0);
        assert_eq!(ctx.seq_value(x).as_deref(), Some("ab"));
        assert_eq!(ctx.seq_value(y).as_deref(), Some("cd"));
    }
}
