use strand::{config::Config, context::Context, reports::Report};

mod int_string {
    use super::*;

    #[test]
    fn itos_binds_by_digit_evaluation() {
        // itos(n) = "042" with n ≥ 0: the digits evaluate to 42.
        let mut ctx = Context::from_config(Config::default());
        let n = ctx.int_var("n");
        let itos = ctx.terms.itos(n);
        let word = ctx.terms.const_str("042");
        let eq = ctx.terms.eq(itos, word);
        ctx.assert_term(eq, true);

        let zero = ctx.terms.int(0);
        let nonneg = ctx.terms.int_le(zero, n);
        ctx.assert_term(nonneg, true);

        assert_eq!(ctx.solve(), Ok(Report::Satisfiable));
        assert_eq!(ctx.int_witness(n), Some(42));
    }

    #[test]
    fn itos_of_negative_cannot_spell_digits() {
        // itos(n) = "042" with n < 0.
        let mut ctx = Context::from_config(Config::default());
        let n = ctx.int_var("n");
        let itos = ctx.terms.itos(n);
        let word = ctx.terms.const_str("042");
        let eq = ctx.terms.eq(itos, word);
        ctx.assert_term(eq, true);

        let zero = ctx.terms.int(0);
        let negative = ctx.terms.int_lt(n, zero);
        ctx.assert_term(negative, true);

        assert_eq!(ctx.solve(), Ok(Report::Unsatisfiable));
    }

    #[test]
    fn itos_of_empty_forces_negative() {
        // itos(n) = ε together with n ≥ 0.
        let mut ctx = Context::from_config(Config::default());
        let n = ctx.int_var("n");
        let itos = ctx.terms.itos(n);
        let e = ctx.terms.empty();
        let eq = ctx.terms.eq(itos, e);
        ctx.assert_term(eq, true);

        let zero = ctx.terms.int(0);
        let nonneg = ctx.terms.int_le(zero, n);
        ctx.assert_term(nonneg, true);

        assert_eq!(ctx.solve(), Ok(Report::Unsatisfiable));
    }

    #[test]
    fn itos_against_non_digits() {
        let mut ctx = Context::from_config(Config::default());
        let n = ctx.int_var("n");
        let itos = ctx.terms.itos(n);
        let word = ctx.terms.const_str("4a");
        let eq = ctx.terms.eq(itos, word);
        ctx.assert_term(eq, true);

        assert_eq!(ctx.solve(), Ok(Report::Unsatisfiable));
    }

    #[test]
    fn stoi_of_constant_evaluates() {
        let mut ctx = Context::from_config(Config::default());
        let n = ctx.int_var("n");
        let word = ctx.terms.const_str("042");
        let stoi = ctx.terms.stoi(word);
        let eq = ctx.terms.eq(n, stoi);
        ctx.assert_term(eq, true);

        assert_eq!(ctx.solve(), Ok(Report::Satisfiable));
        assert_eq!(ctx.int_witness(n), Some(42));
    }

    #[test]
    fn stoi_of_junk_is_minus_one() {
        let mut ctx = Context::from_config(Config::default());
        let n = ctx.int_var("n");
        let word = ctx.terms.const_str("a2");
        let stoi = ctx.terms.stoi(word);
        let eq = ctx.terms.eq(n, stoi);
        ctx.assert_term(eq, true);

        assert_eq!(ctx.solve(), Ok(Report::Satisfiable));
        assert_eq!(ctx.int_witness(n), Some(-1));
    }
}
