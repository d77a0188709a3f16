use strand::{
    config::{ArithKind, Config},
    context::Context,
    reports::Report,
    types::err::{BuildError, ErrorKind},
};

mod basic {
    use super::*;

    #[test]
    fn empty_input_is_satisfiable() {
        let mut ctx = Context::from_config(Config::default());
        assert_eq!(ctx.solve(), Ok(Report::Satisfiable));
    }

    #[test]
    fn concat_equation_solves() {
        // x ++ "ab" = "cab" has exactly x = "c".
        let mut ctx = Context::from_config(Config::default());
        let x = ctx.seq_var("x");
        let ab = ctx.terms.const_str("ab");
        let cab = ctx.terms.const_str("cab");
        let lhs = ctx.terms.concat(&[x, ab]);
        let eq = ctx.terms.eq(lhs, cab);
        ctx.assert_term(eq, true);

        assert_eq!(ctx.solve(), Ok(Report::Satisfiable));
        assert_eq!(ctx.seq_value(x).as_deref(), Some("c"));
    }

    #[test]
    fn distinct_constants_conflict() {
        let mut ctx = Context::from_config(Config::default());
        let a = ctx.terms.const_str("a");
        let b = ctx.terms.const_str("b");
        let eq = ctx.terms.eq(a, b);
        ctx.assert_term(eq, true);

        assert_eq!(ctx.solve(), Ok(Report::Unsatisfiable));
    }

    #[test]
    fn equal_after_normalization_refutes_disequality() {
        // x = "ab" together with x ≠ "a" ++ "b".
        let mut ctx = Context::from_config(Config::default());
        let x = ctx.seq_var("x");
        let ab = ctx.terms.const_str("ab");
        let a = ctx.terms.const_str("a");
        let b = ctx.terms.const_str("b");
        let split = ctx.terms.concat(&[a, b]);

        let is_ab = ctx.terms.eq(x, ab);
        ctx.assert_term(is_ab, true);
        let is_split = ctx.terms.eq(x, split);
        ctx.assert_term(is_split, false);

        assert_eq!(ctx.solve(), Ok(Report::Unsatisfiable));
    }

    #[test]
    fn shared_middle_variable() {
        // "a" ++ x = x ++ "a" is satisfied by x = ε.
        let mut ctx = Context::from_config(Config::default());
        let x = ctx.seq_var("x");
        let a = ctx.terms.const_str("a");
        let lhs = ctx.terms.concat(&[a, x]);
        let rhs = ctx.terms.concat(&[x, a]);
        let eq = ctx.terms.eq(lhs, rhs);
        ctx.assert_term(eq, true);

        let report = ctx.solve().expect("a report");
        assert_ne!(report, Report::Unsatisfiable);
        if report == Report::Satisfiable {
            let value = ctx.seq_value(x).expect("a value");
            assert_eq!(format!("a{value}"), format!("{value}a"));
        }
    }

    #[test]
    fn disabled_arith_engine_refuses_to_search() {
        let mut config = Config::default();
        config.arith_engine.value = ArithKind::Disabled;
        let mut ctx = Context::from_config(config);
        let x = ctx.seq_var("x");
        let e = ctx.terms.empty();
        let eq = ctx.terms.eq(x, e);
        ctx.assert_term(eq, true);

        assert_eq!(
            ctx.solve(),
            Err(ErrorKind::Build(BuildError::IncompatibleArithTheory)),
        );
    }

    #[test]
    fn lexicographic_cycle_is_unsatisfiable() {
        // x < y and y < x close a cycle through transitivity.
        let mut ctx = Context::from_config(Config::default());
        let x = ctx.seq_var("x");
        let y = ctx.seq_var("y");
        let xy = ctx.terms.lex_lt(x, y);
        let yx = ctx.terms.lex_lt(y, x);
        ctx.assert_term(xy, true);
        ctx.assert_term(yx, true);

        assert_eq!(ctx.solve(), Ok(Report::Unsatisfiable));
    }

    #[test]
    fn lexicographic_constants_evaluate() {
        let mut ctx = Context::from_config(Config::default());
        let ab = ctx.terms.const_str("ab");
        let ba = ctx.terms.const_str("ba");
        let lt = ctx.terms.lex_lt(ba, ab);
        ctx.assert_term(lt, true);

        assert_eq!(ctx.solve(), Ok(Report::Unsatisfiable));
    }
}
