mod resolver_tests {
    use rox::ast::{Expr, Stmt};
    use rox::error::RoxError;
    use rox::interpreter::Interpreter;
    use rox::parser::Parser;
    use rox::resolver::Resolver;
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

    fn static_errors(source: &str) -> Vec<RoxError> {
        let tokens = tokens_of(source);
        let program = parse_all(&tokens);
        let mut interpreter = Interpreter::new();
        let mut resolver = Resolver::new(&mut interpreter);
        resolver.resolve(&program);
        resolver.into_errors()
    }

    fn resolve_into<'a>(program: &'a [Stmt<'a>]) -> Interpreter<'a> {
        let mut interpreter = Interpreter::new();
        let mut resolver = Resolver::new(&mut interpreter);
        resolver.resolve(program);
        let errors = resolver.into_errors();
        assert!(errors.is_empty(), "unexpected static errors: {errors:?}");
        interpreter
    }

    #[test]
    fn reading_a_local_in_its_own_initializer_is_an_error() {
        let errors = static_errors("{ var a = a; }");

        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors[0].to_string(),
            "[line 1] Error: Can't read local variable in its own initializer."
        );
        assert!(errors[0].is_static());
    }

    #[test]
    fn redeclaring_a_local_in_the_same_scope_is_an_error() {
        let errors = static_errors("{ var a = 1; var a = 2; }");

        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors[0].to_string(),
            "[line 1] Error: Already a variable with this name in this scope."
        );
    }

    #[test]
    fn redeclaring_a_global_is_allowed() {
        let errors = static_errors("var a = 1; var a = 2;");

        assert!(errors.is_empty(), "globals may be redeclared: {errors:?}");
    }

    #[test]
    fn top_level_return_is_an_error() {
        let errors = static_errors("return 1;");

        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors[0].to_string(),
            "[line 1] Error: Can't return from top-level code."
        );
    }

    #[test]
    fn this_outside_a_class_is_an_error() {
        let errors = static_errors("print this;");

        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors[0].to_string(),
            "[line 1] Error: Can't use 'this' outside of a class."
        );
    }

    #[test]
    fn this_inside_a_plain_function_is_an_error() {
        let errors = static_errors("fun f() { return this; }");

        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors[0].to_string(),
            "[line 1] Error: Can't use 'this' outside of a class."
        );
    }

    #[test]
    fn super_outside_a_class_is_an_error() {
        let errors = static_errors("super.method;");

        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors[0].to_string(),
            "[line 1] Error: Can't use 'super' outside of a class."
        );
    }

    #[test]
    fn super_without_a_superclass_is_an_error() {
        let errors = static_errors("class Lonely { speak() { return super.speak(); } }");

        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors[0].to_string(),
            "[line 1] Error: Can't use 'super' in a class with no superclass."
        );
    }

    #[test]
    fn returning_a_value_from_init_is_an_error() {
        let errors = static_errors("class Thing { init() { return 1; } }");

        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors[0].to_string(),
            "[line 1] Error: Can't return a value from an initializer."
        );
    }

    #[test]
    fn bare_return_inside_init_is_allowed() {
        let errors = static_errors("class Thing { init() { return; } }");

        assert!(errors.is_empty(), "early exit is legal in init: {errors:?}");
    }

    #[test]
    fn inheriting_from_itself_is_an_error() {
        let errors = static_errors("class Snake < Snake {}");

        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors[0].to_string(),
            "[line 1] Error: A class can't inherit from itself."
        );
    }

    #[test]
    fn errors_accumulate_instead_of_stopping_at_the_first() {
        let errors = static_errors("return 1;\nprint this;\nsuper.method;");

        let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
        assert_eq!(
            messages,
            vec![
                "[line 1] Error: Can't return from top-level code.",
                "[line 2] Error: Can't use 'this' outside of a class.",
                "[line 3] Error: Can't use 'super' outside of a class.",
            ]
        );
        assert!(errors.iter().all(RoxError::is_static));
    }

    #[test]
    fn a_clean_program_produces_no_errors() {
        let errors = static_errors(
            r#"class Animal {
                 init(name) { this.name = name; }
                 describe() { return "a " + this.name; }
               }
               class Dog < Animal {
                 init() { super.init("dog"); }
                 describe() { return super.describe() + " that barks"; }
               }
               var pet = Dog();
               print pet.describe();"#,
        );

        assert!(errors.is_empty(), "unexpected static errors: {errors:?}");
    }

    #[test]
    fn global_references_stay_out_of_the_side_table() {
        let tokens = tokens_of("var a = 1; print a; a = 2;");
        let program = parse_all(&tokens);
        let interpreter = resolve_into(&program);

        assert!(interpreter.locals().is_empty());
    }

    #[test]
    fn local_references_record_their_scope_distance() {
        let tokens = tokens_of("{ var a = 1; { print a; a = 5; } }");
        let program = parse_all(&tokens);
        let interpreter = resolve_into(&program);

        let Stmt::Block(outer) = &program[0] else {
            panic!("expected a block, got {:?}", program[0]);
        };
        let Stmt::Block(inner) = &outer[1] else {
            panic!("expected a nested block, got {:?}", outer[1]);
        };
        let Stmt::Print(read) = &inner[0] else {
            panic!("expected a print statement, got {:?}", inner[0]);
        };
        let Stmt::Expression(write) = &inner[1] else {
            panic!("expected an assignment statement, got {:?}", inner[1]);
        };

        // Both references sit one scope below the declaration of `a`.
        let read_addr = read as *const Expr<'_> as usize;
        let write_addr = write as *const Expr<'_> as usize;

        assert_eq!(interpreter.locals().len(), 2);
        assert_eq!(interpreter.locals().get(&read_addr), Some(&1));
        assert_eq!(interpreter.locals().get(&write_addr), Some(&1));
    }

    #[test]
    fn resolution_is_deterministic_across_passes() {
        let tokens = tokens_of(
            r#"{
                 var shadow = 1;
                 {
                   var shadow = 2;
                   print shadow;
                 }
                 print shadow;
               }
               class Base {
                 greet() { return "base"; }
               }
               class Derived < Base {
                 greet() { return super.greet(); }
                 note() { return this; }
               }"#,
        );
        let program = parse_all(&tokens);

        let first = resolve_into(&program);
        let second = resolve_into(&program);

        assert!(!first.locals().is_empty());
        assert_eq!(first.locals(), second.locals());
    }
}
