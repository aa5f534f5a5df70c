use argot::*;

#[test]
fn long_option_attached_and_separate_forms_agree() {
    let schema = Command::new("app")
        .arg(Arg::option("speed").int())
        .to_schema()
        .unwrap();

    let separate = schema.run_inner(Args::from(&["--speed", "12"])).unwrap();
    let attached = schema.run_inner(Args::from(&["--speed=12"])).unwrap();
    assert_eq!(separate.bindings().get::<i64>("speed"), Some(12));
    assert_eq!(attached.bindings().get::<i64>("speed"), Some(12));
}

#[test]
fn attached_value_may_be_negative() {
    let schema = Command::new("app")
        .arg(Arg::option("speed").int())
        .to_schema()
        .unwrap();
    let r = schema.run_inner(Args::from(&["--speed=-12"])).unwrap();
    assert_eq!(r.bindings().get::<i64>("speed"), Some(-12));
}

#[test]
fn short_option_value_forms() {
    let schema = Command::new("app")
        .arg(Arg::option("speed").short('s').int())
        .to_schema()
        .unwrap();

    for input in [&["-s", "12"][..], &["-s=12"][..]] {
        let r = schema.run_inner(Args::from(input)).unwrap();
        assert_eq!(r.bindings().get::<i64>("speed"), Some(12), "input {:?}", input);
    }
}

#[test]
fn bundle_may_end_in_a_joined_value() {
    let schema = Command::new("app")
        .arg(Arg::flag("extract").short('x'))
        .arg(Arg::flag("verbose").short('v'))
        .arg(Arg::option("file").short('f').allow_joined())
        .to_schema()
        .unwrap();

    let r = schema.run_inner(Args::from(&["-xvfarchive.tar"])).unwrap();
    assert!(r.bindings().flag("extract"));
    assert!(r.bindings().flag("verbose"));
    assert_eq!(
        r.bindings().get::<String>("file").as_deref(),
        Some("archive.tar")
    );
}

#[test]
fn joined_value_keeps_everything_after_the_name() {
    let schema = Command::new("app")
        .arg(
            Arg::option("define")
                .short('D')
                .allow_joined()
                .strategy(Strategy::SingleValue),
        )
        .to_schema()
        .unwrap();

    let r = schema
        .run_inner(Args::from(&["-Dkey=value", "-Dother=2"]))
        .unwrap();
    assert_eq!(
        r.bindings().get_all::<String>("define"),
        ["key=value", "other=2"]
    );
}

#[test]
fn joined_value_without_permission_is_ambiguous() {
    let schema = Command::new("app")
        .arg(Arg::option("file").short('f'))
        .to_schema()
        .unwrap();

    let err = schema
        .run_inner(Args::from(&["-fvalue"]))
        .unwrap_err()
        .unwrap_stderr();
    assert_eq!(
        err,
        "`-fvalue` could be a group of short flags or `-f` with an argument, \
         use `-f=value` to disambiguate\nUsage: app --file <FILE>"
    );
}

#[test]
fn single_dash_long_names_resolve_before_bundles() {
    let schema = Command::new("app")
        .arg(Arg::option("jobs").name(Name::single_dash("jobs")).int())
        .arg(Arg::flag("j").short('j'))
        .arg(Arg::flag("o").short('o'))
        .arg(Arg::flag("b").short('b'))
        .arg(Arg::flag("s").short('s'))
        .to_schema()
        .unwrap();

    // every character of `-jobs` spells a flag, the declared single dash
    // name still wins
    let r = schema.run_inner(Args::from(&["-jobs", "4"])).unwrap();
    assert_eq!(r.bindings().get::<i64>("jobs"), Some(4));
    assert!(!r.bindings().flag("j"));
}

#[test]
fn empty_option_name_is_a_lex_error() {
    let schema = Command::new("app").arg(Arg::flag("x")).to_schema().unwrap();
    let err = schema
        .run_inner(Args::from(&["--=v"]))
        .unwrap_err()
        .unwrap_stderr();
    assert_eq!(err, "option name cannot be empty\nUsage: app [--x]");
}

#[test]
fn flags_reject_attached_values() {
    let schema = Command::new("app").arg(Arg::flag("verbose")).to_schema().unwrap();
    let err = schema
        .run_inner(Args::from(&["--verbose=1"]))
        .unwrap_err()
        .unwrap_stderr();
    assert_eq!(
        err,
        "`--verbose=1` is not expected in this context\nUsage: app [--verbose]"
    );
}

#[test]
fn lone_dash_is_an_ordinary_value() {
    let schema = Command::new("app")
        .arg(Arg::positional("file"))
        .to_schema()
        .unwrap();
    let r = schema.run_inner(Args::from(&["-"])).unwrap();
    assert_eq!(r.bindings().get::<String>("file").as_deref(), Some("-"));
}

#[test]
fn option_value_may_look_like_a_number() {
    let schema = Command::new("app")
        .arg(Arg::option("offset").int())
        .to_schema()
        .unwrap();
    let r = schema.run_inner(Args::from(&["--offset", "-12"])).unwrap();
    assert_eq!(r.bindings().get::<i64>("offset"), Some(-12));
}

#[test]
fn scalar_positionals_fill_in_declaration_order() {
    let schema = Command::new("mv")
        .arg(Arg::positional("source"))
        .arg(Arg::positional("dest"))
        .to_schema()
        .unwrap();
    let r = schema.run_inner(Args::from(&["a", "b"])).unwrap();
    assert_eq!(r.bindings().get::<String>("source").as_deref(), Some("a"));
    assert_eq!(r.bindings().get::<String>("dest").as_deref(), Some("b"));
}

#[test]
fn optional_positional_may_be_absent() {
    let schema = Command::new("app")
        .arg(Arg::positional("input"))
        .arg(Arg::positional("output").optional())
        .to_schema()
        .unwrap();

    let r = schema.run_inner(Args::from(&["in.txt"])).unwrap();
    assert_eq!(r.bindings().get::<String>("input").as_deref(), Some("in.txt"));
    assert!(!r.bindings().contains("output"));
    assert_eq!(r.bindings().source("output"), BindingSource::Absent);
}
