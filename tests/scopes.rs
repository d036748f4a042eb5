mod common;

use common::*;
use krait::{Expr, MapLoader, Node};

#[test]
fn function_assignments_do_not_touch_module_scope() {
    // x = 1
    // def f(): x = 2
    // f()
    // print(x)
    let code = vec![
        assign("x", int(1)),
        def("f", &[], vec![assign("x", int(2))]),
        expr(call_name("f", vec![])),
        print1(name("x")),
    ];
    assert_eq!(run_ok(&code), "1\n");
}

#[test]
fn functions_read_module_names_at_call_time() {
    // the function body refers to a name bound only after the def
    let code = vec![
        def("f", &[], vec![ret(name("late"))]),
        assign("late", int(5)),
        print1(call_name("f", vec![])),
    ];
    assert_eq!(run_ok(&code), "5\n");
}

#[test]
fn parameters_shadow_module_names() {
    let code = vec![
        assign("x", int(1)),
        def("f", &["x"], vec![ret(name("x"))]),
        print1(call_name("f", vec![int(9)])),
        print1(name("x")),
    ];
    assert_eq!(run_ok(&code), "9\n1\n");
}

#[test]
fn undefined_name_is_a_name_error() {
    let (out, err) = run_err(&[print1(name("missing"))]);
    assert_eq!(summary(&err), "NameError: name 'missing' is not defined");
    assert_eq!(out, "name 'missing' is not defined\n");
}

#[test]
fn del_unbinds_a_name() {
    let code = vec![
        assign("x", int(1)),
        Node::Del(name("x")),
        print1(name("x")),
    ];
    let (_, err) = run_err(&code);
    assert_eq!(summary(&err), "NameError: name 'x' is not defined");
}

#[test]
fn del_of_an_absent_name_is_a_name_error() {
    let (_, err) = run_err(&[Node::Del(name("ghost"))]);
    assert_eq!(summary(&err), "NameError: name 'ghost' is not defined");
}

#[test]
fn as_expression_binds_and_yields() {
    let code = vec![
        print1(as_(int(7), "y")),
        print1(name("y")),
    ];
    assert_eq!(run_ok(&code), "7\n7\n");
}

#[test]
fn shadowing_an_exception_class_name_does_not_break_raising() {
    // the canonical class is the fallback when the name resolves to a non-class
    let code = vec![assign("NameError", int(0)), print1(name("missing"))];
    let (out, err) = run_err(&code);
    assert_eq!(summary(&err), "NameError: name 'missing' is not defined");
    assert_eq!(out, "name 'missing' is not defined\n");
}

fn mylib() -> Vec<Node> {
    vec![
        assign("value", int(42)),
        def("helper", &[], vec![ret(str_("helped"))]),
        def("get_late", &[], vec![ret(name("late_bound"))]),
    ]
}

#[test]
fn import_binds_the_module() {
    let loader = MapLoader::new().with_module("mylib", mylib());
    let code = vec![
        Node::Import(vec![name("mylib")]),
        print1(attr(name("mylib"), "value")),
    ];
    assert_eq!(run_with_modules(loader, &code), "42\n");
}

#[test]
fn module_function_calls_do_not_prepend_the_receiver() {
    // mylib.helper takes zero parameters; a bound-method convention on
    // module attributes would make this an arity error
    let loader = MapLoader::new().with_module("mylib", mylib());
    let code = vec![
        Node::Import(vec![name("mylib")]),
        print1(call(attr(name("mylib"), "helper"), vec![])),
    ];
    assert_eq!(run_with_modules(loader, &code), "helped\n");
}

#[test]
fn import_with_alias() {
    let loader = MapLoader::new().with_module("mylib", mylib());
    let code = vec![
        Node::Import(vec![as_(name("mylib"), "m")]),
        print1(attr(name("m"), "value")),
    ];
    assert_eq!(run_with_modules(loader, &code), "42\n");
}

#[test]
fn reimport_yields_the_same_module() {
    let loader = MapLoader::new().with_module("mylib", mylib());
    let code = vec![
        Node::Import(vec![name("mylib")]),
        Node::Import(vec![as_(name("mylib"), "m2")]),
        assign_attr(name("mylib"), "stamp", int(9)),
        print1(attr(name("m2"), "stamp")),
    ];
    assert_eq!(run_with_modules(loader, &code), "9\n");
}

#[test]
fn glob_import_copies_module_bindings() {
    let loader = MapLoader::new().with_module("mylib", mylib());
    let code = vec![
        Node::ImportFrom {
            source: Expr::RelativeImport {
                level: 0,
                path: "mylib".to_string(),
            },
            names: vec![Expr::Glob],
        },
        print1(name("value")),
        print1(call_name("helper", vec![])),
    ];
    assert_eq!(run_with_modules(loader, &code), "42\nhelped\n");
}

#[test]
fn selective_import_is_not_implemented() {
    let loader = MapLoader::new().with_module("mylib", mylib());
    let code = vec![Node::ImportFrom {
        source: Expr::RelativeImport {
            level: 0,
            path: "mylib".to_string(),
        },
        names: vec![name("value")],
    }];
    let mut interp = krait::Interpreter::new(loader, krait::CollectStringPrint::new());
    let err = interp.run("test.py", &code).expect_err("selective import should fail");
    assert_eq!(summary(&err), "NotImplementedError: only glob imports are supported");
}

#[test]
fn missing_module_is_a_system_error() {
    let (out, err) = run_err(&[Node::Import(vec![name("nowhere")])]);
    assert_eq!(summary(&err), "SystemError: no module named 'nowhere'");
    assert_eq!(out, "no module named 'nowhere'\n");
}

#[test]
fn imported_functions_resolve_against_the_callers_module() {
    // no closures: mylib.get_late finds `late_bound` in the *calling*
    // module's scope, because free names resolve at call time
    let loader = MapLoader::new().with_module("mylib", mylib());
    let code = vec![
        Node::Import(vec![name("mylib")]),
        assign("late_bound", int(99)),
        print1(call(attr(name("mylib"), "get_late"), vec![])),
    ];
    assert_eq!(run_with_modules(loader, &code), "99\n");
}

#[test]
fn module_top_level_failure_propagates_to_the_importer() {
    let loader = MapLoader::new().with_module("broken", vec![raise("RuntimeError", "broken module")]);
    let code = vec![try_except(
        vec![Node::Import(vec![name("broken")])],
        vec![except(
            "RuntimeError",
            Some("e"),
            vec![print1(attr(name("e"), "message"))],
        )],
    )];
    assert_eq!(run_with_modules(loader, &code), "broken module\nbroken module\n");
}
