use rox::error::Reporter;
use rox::interpreter::Interpreter;

struct Outcome {
    stdout: String,
    had_error: bool,
    had_runtime_error: bool,
}

/// Runs a whole program in a fresh script-mode session.
fn interpret(source: &str) -> Outcome {
    let mut reporter = Reporter::new();
    let mut interpreter = Interpreter::new(Vec::new(), false);

    rox::run(source, &mut interpreter, &mut reporter);

    Outcome {
        stdout: String::from_utf8(interpreter.into_output()).expect("output is valid UTF-8"),
        had_error: reporter.had_error(),
        had_runtime_error: reporter.had_runtime_error(),
    }
}

/// Feeds lines one at a time into a REPL-mode session, resetting the reporter
/// between lines the way the prompt loop does.
fn interpret_repl(lines: &[&str]) -> String {
    let mut reporter = Reporter::new();
    let mut interpreter = Interpreter::new(Vec::new(), true);

    for line in lines {
        rox::run(line, &mut interpreter, &mut reporter);
        reporter.reset();
    }

    String::from_utf8(interpreter.into_output()).expect("output is valid UTF-8")
}

fn assert_prints(source: &str, expected: &str) {
    let outcome = interpret(source);
    assert!(!outcome.had_error, "unexpected static error");
    assert!(!outcome.had_runtime_error, "unexpected runtime error");
    assert_eq!(outcome.stdout, expected);
}

// ─────────────────────────────────────────────────────────────────────────
// Expressions and statements
// ─────────────────────────────────────────────────────────────────────────

#[test]
fn arithmetic() {
    assert_prints("print 1 + 2;", "3\n");
    assert_prints("print 1 + 2 * 3;", "7\n");
    assert_prints("print (1 + 2) * 3;", "9\n");
    assert_prints("print 10 / 4;", "2.5\n");
    assert_prints("print -(3 - 5);", "2\n");
}

#[test]
fn string_concatenation() {
    assert_prints("print \"foo\" + \"bar\";", "foobar\n");
}

#[test]
fn number_stringification() {
    // Integral doubles render without a fractional part.
    assert_prints("print 1.0;", "1\n");
    assert_prints("print 2.5;", "2.5\n");
    assert_prints("print 0.5 + 0.25;", "0.75\n");
}

#[test]
fn literals_round_trip_through_print() {
    assert_prints("print nil;", "nil\n");
    assert_prints("print true;", "true\n");
    assert_prints("print false;", "false\n");
    assert_prints("print \"a string\";", "a string\n");
    assert_prints("print 42;", "42\n");
}

#[test]
fn truthiness() {
    // Only nil and false are falsy; 0 and "" are truthy.
    assert_prints("print !nil;", "true\n");
    assert_prints("print !false;", "true\n");
    assert_prints("print !true;", "false\n");
    assert_prints("print !0;", "false\n");
    assert_prints("print !\"\";", "false\n");
    assert_prints("print !!nil;", "false\n");
}

#[test]
fn equality() {
    assert_prints("print nil == nil;", "true\n");
    assert_prints("print 1 == 1;", "true\n");
    assert_prints("print \"x\" == \"x\";", "true\n");

    // Different types are never equal, and never an error.
    assert_prints("print 1 == \"1\";", "false\n");
    assert_prints("print nil == false;", "false\n");

    // a == b iff !(a != b)
    assert_prints("print (1 == 2) == !(1 != 2);", "true\n");
    assert_prints("print (nil == nil) == !(nil != nil);", "true\n");
}

#[test]
fn comparison_operators() {
    assert_prints("print 1 < 2;", "true\n");
    assert_prints("print 2 <= 2;", "true\n");
    assert_prints("print 3 > 4;", "false\n");
    assert_prints("print 4 >= 5;", "false\n");
}

#[test]
fn logical_operators_return_operand_values() {
    assert_prints("print \"hi\" or 2;", "hi\n");
    assert_prints("print nil or \"yes\";", "yes\n");
    assert_prints("print nil and 2;", "nil\n");
    assert_prints("print 1 and 2;", "2\n");
}

#[test]
fn logical_operators_short_circuit() {
    let source = r#"
        var called = false;
        fun touch() { called = true; return true; }
        false and touch();
        print called;
        true or touch();
        print called;
    "#;
    assert_prints(source, "false\nfalse\n");
}

#[test]
fn if_else() {
    assert_prints(
        "var x; if (2 + 2 == 4) x = 1; else x = 2; print x;",
        "1\n",
    );
    assert_prints(
        "var x; if (2 + 2 != 4) x = 1; else x = 2; print x;",
        "2\n",
    );
}

#[test]
fn while_loop() {
    let source = r#"
        var i = 0;
        while (i < 3) {
            print i;
            i = i + 1;
        }
    "#;
    assert_prints(source, "0\n1\n2\n");
}

#[test]
fn for_loop_desugars_to_while() {
    assert_prints(
        "for (var i = 0; i < 3; i = i + 1) print i;",
        "0\n1\n2\n",
    );

    // The initializer may be an expression, or missing entirely.
    assert_prints(
        "var i = 10; for (; i > 8; i = i - 1) print i;",
        "10\n9\n",
    );
}

#[test]
fn block_scoping() {
    assert_prints(
        "{ var a = 1; { var a = 2; print a; } print a; }",
        "2\n1\n",
    );
}

// ─────────────────────────────────────────────────────────────────────────
// Functions and closures
// ─────────────────────────────────────────────────────────────────────────

#[test]
fn function_call_and_return() {
    let source = r#"
        fun max(x, y) {
            if (x > y) {
                return x;
            } else {
                return y;
            }
        }
        print max(10, 20);
    "#;
    assert_prints(source, "20\n");
}

#[test]
fn implicit_return_is_nil() {
    assert_prints("fun f() {} print f();", "nil\n");
}

#[test]
fn return_unwinds_nested_blocks_and_loops() {
    let source = r#"
        fun f() {
            while (true) {
                {
                    return "done";
                }
            }
        }
        print f();
    "#;
    assert_prints(source, "done\n");
}

#[test]
fn recursion() {
    let source = r#"
        fun fib(n) {
            if (n < 2) return n;
            return fib(n - 1) + fib(n - 2);
        }
        print fib(10);
    "#;
    assert_prints(source, "55\n");
}

#[test]
fn closures_capture_their_environment() {
    let source = r#"
        fun makeCounter() {
            var i = 0;
            fun count() {
                i = i + 1;
                print i;
            }
            return count;
        }
        var c = makeCounter();
        c();
        c();
    "#;
    assert_prints(source, "1\n2\n");
}

#[test]
fn resolver_pins_variables_to_declaration_scope() {
    let source = r#"
        var a = "global";
        {
            fun showA() {
                print a;
            }
            showA();
            var a = "block";
            showA();
        }
    "#;
    assert_prints(source, "global\nglobal\n");
}

#[test]
fn shadowing_across_nested_functions() {
    let source = r#"
        var x = "outer";
        fun outer() {
            var x = "middle";
            fun inner() {
                print x;
            }
            inner();
        }
        outer();
    "#;
    assert_prints(source, "middle\n");
}

#[test]
fn function_values_stringify() {
    assert_prints("fun f() {} print f;", "<fn f>\n");
    assert_prints("print clock;", "<native fn clock>\n");
}

#[test]
fn clock_returns_a_number() {
    assert_prints("print clock() > 0;", "true\n");
}

// ─────────────────────────────────────────────────────────────────────────
// Classes, instances, inheritance
// ─────────────────────────────────────────────────────────────────────────

#[test]
fn fields_and_methods() {
    let source = r#"
        class Cake {
            taste() {
                print "The " + this.flavor + " cake is delicious";
            }
        }
        var cake = Cake();
        cake.flavor = "chocolate";
        cake.taste();
    "#;
    assert_prints(source, "The chocolate cake is delicious\n");
}

#[test]
fn bound_methods_remember_their_receiver() {
    let source = r#"
        class Person {
            sayName() {
                print this.name;
            }
        }
        var jane = Person();
        jane.name = "Jane";
        var method = jane.sayName;
        method();
    "#;
    assert_prints(source, "Jane\n");
}

#[test]
fn initializer_runs_on_construction() {
    let source = r#"
        class Point {
            init(x, y) {
                this.x = x;
                this.y = y;
            }
        }
        var p = Point(3, 4);
        print p.x + p.y;
    "#;
    assert_prints(source, "7\n");
}

#[test]
fn initializer_always_returns_the_instance() {
    assert_prints("class Foo { init() { return; } } print Foo();", "Foo instance\n");

    // Calling init directly through an instance also yields the instance.
    let source = r#"
        class Foo {
            init() {}
        }
        var foo = Foo();
        print foo.init();
    "#;
    assert_prints(source, "Foo instance\n");
}

#[test]
fn instances_stringify_with_their_class_name() {
    assert_prints("class Bagel {} print Bagel();", "Bagel instance\n");
    assert_prints("class Bagel {} print Bagel;", "<class Bagel>\n");
}

#[test]
fn methods_are_inherited() {
    let source = r#"
        class Doughnut {
            cook() {
                print "Fry until golden brown.";
            }
        }
        class BostonCream < Doughnut {}
        BostonCream().cook();
    "#;
    assert_prints(source, "Fry until golden brown.\n");
}

#[test]
fn super_calls_the_superclass_method() {
    let source = r#"
        class A {
            method() {
                print "A";
            }
        }
        class B < A {
            method() {
                super.method();
                print "B";
            }
        }
        B().method();
    "#;
    assert_prints(source, "A\nB\n");
}

#[test]
fn super_binds_this_to_the_original_receiver() {
    let source = r#"
        class Base {
            whoAmI() {
                print this.tag;
            }
        }
        class Derived < Base {
            whoAmI() {
                super.whoAmI();
            }
        }
        var d = Derived();
        d.tag = "derived";
        d.whoAmI();
    "#;
    assert_prints(source, "derived\n");
}

// ─────────────────────────────────────────────────────────────────────────
// Runtime errors
// ─────────────────────────────────────────────────────────────────────────

#[test]
fn type_error_aborts_the_run() {
    let outcome = interpret("print 1; \"a\" - 1; print 2;");
    assert!(outcome.had_runtime_error);
    assert!(!outcome.had_error);
    assert_eq!(outcome.stdout, "1\n");
}

#[test]
fn unary_minus_requires_a_number() {
    let outcome = interpret("-\"muffin\";");
    assert!(outcome.had_runtime_error);
}

#[test]
fn plus_requires_matching_operand_types() {
    let outcome = interpret("1 + \"1\";");
    assert!(outcome.had_runtime_error);
}

#[test]
fn undefined_variable_is_a_runtime_error() {
    let outcome = interpret("print missing;");
    assert!(outcome.had_runtime_error);

    let outcome = interpret("missing = 1;");
    assert!(outcome.had_runtime_error);
}

#[test]
fn calling_a_non_callable_is_a_runtime_error() {
    let outcome = interpret("\"not a function\"();");
    assert!(outcome.had_runtime_error);
}

#[test]
fn arity_mismatch_runs_no_part_of_the_body() {
    let outcome = interpret(
        r#"
        fun f(a, b) {
            print "should not run";
        }
        f(1);
    "#,
    );
    assert!(outcome.had_runtime_error);
    assert_eq!(outcome.stdout, "");
}

#[test]
fn property_access_requires_an_instance() {
    let outcome = interpret("var x = 1; print x.field;");
    assert!(outcome.had_runtime_error);

    let outcome = interpret("var x = 1; x.field = 2;");
    assert!(outcome.had_runtime_error);
}

#[test]
fn undefined_property_is_a_runtime_error() {
    let outcome = interpret("class Empty {} print Empty().nothing;");
    assert!(outcome.had_runtime_error);
}

#[test]
fn superclass_must_be_a_class() {
    let outcome = interpret("var NotAClass = \"so not a class\"; class Sub < NotAClass {}");
    assert!(outcome.had_runtime_error);
}

// ─────────────────────────────────────────────────────────────────────────
// Static errors
// ─────────────────────────────────────────────────────────────────────────

#[test]
fn parse_error_sets_the_static_flag_and_skips_execution() {
    let outcome = interpret("var; print \"never\";");
    assert!(outcome.had_error);
    assert!(!outcome.had_runtime_error);
    assert_eq!(outcome.stdout, "");
}

#[test]
fn parser_recovers_and_reports_later_statements() {
    // Both bad statements produce diagnostics; nothing executes.
    let outcome = interpret("var; print 1; fun;");
    assert!(outcome.had_error);
    assert_eq!(outcome.stdout, "");
}

#[test]
fn invalid_assignment_target() {
    let outcome = interpret("1 = 2;");
    assert!(outcome.had_error);
}

#[test]
fn return_outside_a_function() {
    let outcome = interpret("return 1;");
    assert!(outcome.had_error);
}

#[test]
fn returning_a_value_from_an_initializer() {
    let outcome = interpret("class Foo { init() { return 1; } }");
    assert!(outcome.had_error);

    // A bare return is fine.
    let outcome = interpret("class Foo { init() { return; } }");
    assert!(!outcome.had_error);
}

#[test]
fn this_outside_a_class() {
    let outcome = interpret("print this;");
    assert!(outcome.had_error);

    let outcome = interpret("fun f() { print this; }");
    assert!(outcome.had_error);
}

#[test]
fn super_misuse_is_a_static_error() {
    let outcome = interpret("print super.method;");
    assert!(outcome.had_error);

    let outcome = interpret("class NoParent { method() { super.method(); } }");
    assert!(outcome.had_error);
}

#[test]
fn class_cannot_inherit_from_itself() {
    let outcome = interpret("class Ouroboros < Ouroboros {}");
    assert!(outcome.had_error);
}

#[test]
fn duplicate_local_declaration() {
    let outcome = interpret("fun f() { var a = 1; var a = 2; }");
    assert!(outcome.had_error);
}

#[test]
fn reading_a_local_in_its_own_initializer() {
    let outcome = interpret("{ var a = a; }");
    assert!(outcome.had_error);
}

// ─────────────────────────────────────────────────────────────────────────
// Sessions
// ─────────────────────────────────────────────────────────────────────────

#[test]
fn repl_echoes_plain_expressions() {
    assert_eq!(interpret_repl(&["1 + 2;"]), "3\n");
}

#[test]
fn repl_does_not_echo_assignments_or_calls() {
    let output = interpret_repl(&["var a = 1;", "a = 2;", "fun f() { return 3; }", "f();"]);
    assert_eq!(output, "");
}

#[test]
fn repl_keeps_global_state_across_lines() {
    let output = interpret_repl(&["var a = 1;", "print a;", "a = a + 1;", "print a;"]);
    assert_eq!(output, "1\n2\n");
}

#[test]
fn repl_closures_survive_later_lines() {
    let output = interpret_repl(&[
        "fun makeCounter() { var i = 0; fun count() { i = i + 1; print i; } return count; }",
        "var c = makeCounter();",
        "c();",
        "var unrelated = 0;",
        "c();",
    ]);
    assert_eq!(output, "1\n2\n");
}

#[test]
fn repl_survives_errors_on_earlier_lines() {
    let output = interpret_repl(&["var;", "\"a\" - 1;", "print 42;"]);
    assert_eq!(output, "42\n");
}

#[test]
fn script_mode_does_not_echo_expressions() {
    assert_prints("1 + 2;", "");
}

#[test]
fn fresh_runs_are_deterministic() {
    let source = r#"
        fun fib(n) {
            if (n < 2) return n;
            return fib(n - 1) + fib(n - 2);
        }
        for (var i = 0; i < 8; i = i + 1) print fib(i);
    "#;
    let first = interpret(source);
    let second = interpret(source);
    assert_eq!(first.stdout, second.stdout);
}
