mod parser_tests {
    use pretty_assertions::assert_eq;

    use rox::ast::{Expr, LiteralValue, Stmt};
    use rox::ast_printer::AstPrinter;
    use rox::parser::Parser;
    use rox::scanner::Scanner;
    use rox::token::Token;

    fn tokens_of(source: &str) -> Vec<Token<'_>> {
        Scanner::new(source.as_bytes())
            .collect::<Result<Vec<_>, _>>()
            .expect("test source scans cleanly")
    }

    fn parse_all<'a>(tokens: &'a [Token<'a>]) -> Vec<Stmt<'a>> {
        Parser::new(tokens)
            .collect::<Result<Vec<_>, _>>()
            .expect("test source parses cleanly")
    }

    fn printed(source: &str) -> String {
        let tokens = tokens_of(source);
        let expression = Parser::new(&tokens)
            .parse_expression()
            .expect("test source parses cleanly");

        AstPrinter.print(&expression)
    }

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        assert_eq!(printed("1 + 2 * 3"), "(+ 1.0 (* 2.0 3.0))");
    }

    #[test]
    fn unary_and_grouping_nest() {
        assert_eq!(printed("-123 * (45.67)"), "(* (- 123.0) (group 45.67))");
        assert_eq!(printed("!(true == false)"), "(! (group (== true false)))");
    }

    #[test]
    fn comparison_binds_tighter_than_equality() {
        assert_eq!(printed("1 < 2 == true"), "(== (< 1.0 2.0) true)");
    }

    #[test]
    fn and_binds_tighter_than_or() {
        assert_eq!(printed("a or b and c"), "(or a (and b c))");
    }

    #[test]
    fn assignment_is_right_associative() {
        assert_eq!(printed("a = b = 3"), "(= a (= b 3.0))");
    }

    #[test]
    fn property_writes_print_as_set() {
        assert_eq!(printed("obj.value = 1"), "(set obj value 1.0)");
        assert_eq!(
            printed("obj.inner.value = 1"),
            "(set (. obj inner) value 1.0)"
        );
    }

    #[test]
    fn calls_and_property_chains() {
        assert_eq!(printed("f()"), "(call f)");
        assert_eq!(printed("f(1)(2)"), "(call (call f 1.0) 2.0)");
        assert_eq!(printed("a.b(1).c"), "(. (call (. a b) 1.0) c)");
    }

    #[test]
    fn this_and_super_forms() {
        assert_eq!(printed("this.x"), "(. this x)");
        assert_eq!(printed("super.method"), "(super method)");
    }

    #[test]
    fn invalid_assignment_target_is_rejected() {
        let tokens = tokens_of("a + b = c");
        let error = Parser::new(&tokens)
            .parse_expression()
            .expect_err("a sum is not assignable");

        assert_eq!(error.to_string(), "[line 1] Error: Invalid assignment target");
    }

    #[test]
    fn statement_shapes() {
        let tokens = tokens_of(
            "var a = 1;\n\
             print a;\n\
             if (a) print 1; else print 2;\n\
             while (false) print 3;\n\
             { print 4; }\n\
             fun f(x) { return x; }\n\
             return;",
        );
        let program = parse_all(&tokens);

        assert_eq!(program.len(), 7);
        assert!(matches!(program[0], Stmt::Var { .. }));
        assert!(matches!(program[1], Stmt::Print(_)));
        assert!(matches!(
            program[2],
            Stmt::If {
                else_branch: Some(_),
                ..
            }
        ));
        assert!(matches!(program[3], Stmt::While { .. }));
        assert!(matches!(program[4], Stmt::Block(_)));

        let Stmt::Function { name, params, .. } = &program[5] else {
            panic!("expected a function declaration, got {:?}", program[5]);
        };
        assert_eq!(name.lexeme, "f");
        assert_eq!(params.len(), 1);

        assert!(matches!(program[6], Stmt::Return { value: None, .. }));
    }

    #[test]
    fn class_declarations_carry_superclass_and_methods() {
        let tokens = tokens_of("class C < D { m() { return 1; } n() {} }");
        let program = parse_all(&tokens);

        assert_eq!(program.len(), 1);

        let Stmt::Class {
            name,
            superclass,
            methods,
        } = &program[0]
        else {
            panic!("expected a class declaration, got {:?}", program[0]);
        };

        assert_eq!(name.lexeme, "C");
        assert_eq!(methods.len(), 2);

        let Some(Expr::Variable(superclass_name)) = superclass else {
            panic!("expected a superclass reference, got {:?}", superclass);
        };
        assert_eq!(superclass_name.lexeme, "D");
    }

    #[test]
    fn for_desugars_into_block_and_while() {
        let tokens = tokens_of("for (var i = 0; i < 3; i = i + 1) print i;");
        let program = parse_all(&tokens);

        assert_eq!(program.len(), 1);

        // for (init; cond; incr) body becomes:
        // { init; while (cond) { body; incr; } }
        let Stmt::Block(statements) = &program[0] else {
            panic!("expected the loop to desugar to a block, got {:?}", program[0]);
        };
        assert_eq!(statements.len(), 2);
        assert!(matches!(statements[0], Stmt::Var { .. }));

        let Stmt::While { condition, body } = &statements[1] else {
            panic!("expected a while loop, got {:?}", statements[1]);
        };
        assert!(matches!(condition, Expr::Binary { .. }));

        let Stmt::Block(inner) = body.as_ref() else {
            panic!("expected the loop body to be a block, got {:?}", body);
        };
        assert_eq!(inner.len(), 2);
        assert!(matches!(inner[0], Stmt::Print(_)));

        let Stmt::Expression(expression) = &inner[1] else {
            panic!("expected the increment statement, got {:?}", inner[1]);
        };
        assert!(matches!(expression, Expr::Assign { .. }));
    }

    #[test]
    fn for_without_clauses_is_a_bare_loop() {
        let tokens = tokens_of("for (;;) print 1;");
        let program = parse_all(&tokens);

        assert_eq!(program.len(), 1);

        let Stmt::While { condition, body } = &program[0] else {
            panic!("expected a while loop, got {:?}", program[0]);
        };
        assert!(matches!(condition, Expr::Literal(LiteralValue::True)));
        assert!(matches!(body.as_ref(), Stmt::Print(_)));
    }

    #[test]
    fn parser_recovers_at_statement_boundaries() {
        let tokens = tokens_of("var = 1;\nprint 2;\nvar x 3;\nprint 4;");
        let results: Vec<_> = Parser::new(&tokens).collect();

        assert_eq!(results.len(), 4);
        assert!(results[0].is_err());
        assert!(matches!(results[1], Ok(Stmt::Print(_))));
        assert!(results[2].is_err());
        assert!(matches!(results[3], Ok(Stmt::Print(_))));

        let messages: Vec<String> = results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .map(ToString::to_string)
            .collect();
        assert_eq!(
            messages,
            vec![
                "[line 1] Error: Expected variable name",
                "[line 3] Error: Expected ';' after variable declaration",
            ]
        );
    }

    #[test]
    fn parameter_lists_cap_at_255() {
        let params = (0..256)
            .map(|i| format!("p{i}"))
            .collect::<Vec<_>>()
            .join(", ");
        let source = format!("fun big({params}) {{}}");
        let tokens = tokens_of(&source);
        let results: Vec<_> = Parser::new(&tokens).collect();

        assert_eq!(results.len(), 1);

        let error = results[0]
            .as_ref()
            .expect_err("256 parameters should be rejected");
        assert_eq!(
            error.to_string(),
            "[line 1] Error: Cannot have more than 255 parameters"
        );
    }

    #[test]
    fn argument_lists_cap_at_255() {
        let arguments = (0..256)
            .map(|i| i.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        let source = format!("f({arguments});");
        let tokens = tokens_of(&source);
        let results: Vec<_> = Parser::new(&tokens).collect();

        assert_eq!(results.len(), 1);

        let error = results[0]
            .as_ref()
            .expect_err("256 arguments should be rejected");
        assert_eq!(
            error.to_string(),
            "[line 1] Error: Cannot have more than 255 arguments"
        );
    }
}
