use crate::*;

fn math() -> Schema {
    Command::new("math")
        .summary("A math utility")
        .command(
            Command::new("add")
                .alias("a")
                .summary("Print the sum")
                .arg(Arg::positional("values").variadic().int()),
        )
        .command(
            Command::new("multiply")
                .summary("Print the product")
                .arg(Arg::positional("values").variadic().int()),
        )
        .command(
            Command::new("stats")
                .command(
                    Command::new("average")
                        .arg(Arg::option("kind").optional())
                        .arg(Arg::positional("values").variadic().int()),
                )
                .command(Command::new("stdev").arg(Arg::positional("values").variadic().int())),
        )
        .to_schema()
        .unwrap()
}

#[test]
fn option_and_repeated_positional() {
    let schema = Command::new("app")
        .arg(Arg::option("name"))
        .arg(Arg::positional("files").variadic())
        .to_schema()
        .unwrap();

    let r = schema
        .run_inner(Args::from(&["--name", "alpha", "a.txt", "b.txt"]))
        .unwrap();
    assert_eq!(r.bindings().get::<String>("name").as_deref(), Some("alpha"));
    assert_eq!(r.bindings().get_all::<String>("files"), ["a.txt", "b.txt"]);

    // order independence between the option and the positionals
    let r = schema
        .run_inner(Args::from(&["a.txt", "--name", "alpha", "b.txt"]))
        .unwrap();
    assert_eq!(r.bindings().get::<String>("name").as_deref(), Some("alpha"));
    assert_eq!(r.bindings().get_all::<String>("files"), ["a.txt", "b.txt"]);
}

#[test]
fn subcommand_dispatch() {
    let schema = math();

    let r = schema.run_inner(Args::from(&["add", "10", "15", "7"])).unwrap();
    assert_eq!(r.command(), "add");
    assert_eq!(r.bindings().get_all::<i64>("values"), [10, 15, 7]);

    let r = schema
        .run_inner(Args::from(&[
            "stats", "average", "--kind", "median", "3", "4", "13", "15", "15",
        ]))
        .unwrap();
    assert_eq!(r.path(), ["math", "stats", "average"]);
    assert_eq!(r.bindings().get::<String>("kind").as_deref(), Some("median"));
    assert_eq!(r.bindings().get_all::<i64>("values"), [3, 4, 13, 15, 15]);
}

#[test]
fn command_alias_dispatch() {
    let schema = math();
    let r = schema.run_inner(Args::from(&["a", "1", "2"])).unwrap();
    assert_eq!(r.command(), "add");
    assert_eq!(r.bindings().get_all::<i64>("values"), [1, 2]);
}

#[test]
fn short_flag_bundle_with_positional() {
    let schema = Command::new("app")
        .arg(Arg::flag("verbose").short('v').long("verbose"))
        .arg(Arg::flag("f").short('f'))
        .arg(Arg::positional("name"))
        .to_schema()
        .unwrap();

    let r = schema.run_inner(Args::from(&["-vf", "myfile"])).unwrap();
    assert!(r.bindings().flag("verbose"));
    assert!(r.bindings().flag("f"));
    assert_eq!(r.bindings().get::<String>("name").as_deref(), Some("myfile"));
}

fn config_schema() -> Schema {
    Command::new("app")
        .arg(Arg::option("config").default_as_flag(Value::Str("debug".to_string())))
        .arg(
            Arg::positional("files")
                .strategy(Strategy::CaptureForPassthrough)
                .optional(),
        )
        .to_schema()
        .unwrap()
}

#[test]
fn default_as_flag_blocked_by_terminator() {
    let schema = config_schema();
    let r = schema.run_inner(Args::from(&["--config", "--", "value"])).unwrap();
    assert_eq!(r.bindings().get::<String>("config").as_deref(), Some("debug"));
    assert_eq!(r.bindings().get_all::<String>("files"), ["value"]);
}

#[test]
fn default_as_flag_takes_following_value() {
    let schema = config_schema();
    let r = schema
        .run_inner(Args::from(&["--config", "release", "--", "other"]))
        .unwrap();
    assert_eq!(r.bindings().get::<String>("config").as_deref(), Some("release"));
    assert_eq!(r.bindings().get_all::<String>("files"), ["other"]);
}

#[test]
fn default_as_flag_attached_value_wins() {
    let schema = config_schema();
    let r = schema.run_inner(Args::from(&["--config=release"])).unwrap();
    assert_eq!(r.bindings().get::<String>("config").as_deref(), Some("release"));
}

#[test]
fn repeated_single_value_collects_in_order() {
    let schema = Command::new("app")
        .arg(Arg::option("b").short('b').int().strategy(Strategy::SingleValue))
        .to_schema()
        .unwrap();

    let r = schema
        .run_inner(Args::from(&["-b", "1", "-b", "2", "-b", "3"]))
        .unwrap();
    assert_eq!(r.bindings().get_all::<i64>("b"), [1, 2, 3]);
}

#[test]
fn repeated_single_value_scales_linearly() {
    let schema = Command::new("app")
        .arg(Arg::option("b").short('b').int().strategy(Strategy::SingleValue))
        .to_schema()
        .unwrap();

    let parse_n = |n: usize| {
        let tokens: Vec<String> = (0..n)
            .flat_map(|i| ["-b".to_string(), i.to_string()])
            .collect();
        let refs: Vec<&str> = tokens.iter().map(String::as_str).collect();
        let start = std::time::Instant::now();
        let r = schema.run_inner(Args::from(refs.as_slice())).unwrap();
        assert_eq!(r.bindings().get_all::<i64>("b").len(), n);
        start.elapsed()
    };

    let t100 = parse_n(100);
    let t200 = parse_n(200);
    assert!(
        t200 < t100 * 10 + std::time::Duration::from_millis(10),
        "T(200)={:?} should stay within 10x of T(100)={:?}",
        t200,
        t100
    );
}

#[test]
fn inversion_chooses_the_last_spelling() {
    let schema = Command::new("app")
        .arg(Arg::flag("download").invertible(Inversion::PrefixedEnableDisable))
        .arg(Arg::flag("extattr").invertible(Inversion::PrefixedNo))
        .to_schema()
        .unwrap();

    let r = schema
        .run_inner(Args::from(&["--disable-download", "--enable-download"]))
        .unwrap();
    assert!(r.bindings().flag("download"));

    let r = schema
        .run_inner(Args::from(&["--no-extattr", "--extattr"]))
        .unwrap();
    assert!(r.bindings().flag("extattr"));

    let r = schema
        .run_inner(Args::from(&["--extattr", "--no-extattr"]))
        .unwrap();
    assert!(!r.bindings().flag("extattr"));
}

#[test]
fn terminator_demotes_everything_to_values() {
    let schema = Command::new("app")
        .arg(Arg::flag("verbose").short('v'))
        .arg(Arg::positional("rest").variadic())
        .to_schema()
        .unwrap();

    let r = schema
        .run_inner(Args::from(&["-v", "--", "-v", "--verbose", "add"]))
        .unwrap();
    assert!(r.bindings().flag("verbose"));
    assert_eq!(
        r.bindings().get_all::<String>("rest"),
        ["-v", "--verbose", "add"]
    );
}

#[test]
fn exclusivity_policies() {
    let first = Command::new("app")
        .arg(Arg::option("mode").choose_first())
        .to_schema()
        .unwrap();
    let r = first
        .run_inner(Args::from(&["--mode", "a", "--mode", "b"]))
        .unwrap();
    assert_eq!(r.bindings().get::<String>("mode").as_deref(), Some("a"));

    let last = Command::new("app")
        .arg(Arg::option("mode").choose_last())
        .to_schema()
        .unwrap();
    let r = last
        .run_inner(Args::from(&["--mode", "a", "--mode", "b"]))
        .unwrap();
    assert_eq!(r.bindings().get::<String>("mode").as_deref(), Some("b"));

    let exclusive = Command::new("app")
        .arg(Arg::option("mode").exclusive())
        .to_schema()
        .unwrap();
    let err = exclusive
        .run_inner(Args::from(&["--mode", "a", "--mode", "b"]))
        .unwrap_err()
        .unwrap_stderr();
    assert_eq!(
        err,
        "argument `--mode` cannot be used multiple times\nUsage: app --mode <MODE>"
    );
}

#[test]
fn negative_numbers_flow_into_numeric_positionals() {
    let ints = Command::new("app")
        .arg(Arg::positional("values").variadic().int())
        .to_schema()
        .unwrap();
    let r = ints.run_inner(Args::from(&["-1", "2", "-3"])).unwrap();
    assert_eq!(r.bindings().get_all::<i64>("values"), [-1, 2, -3]);

    let floats = Command::new("app")
        .arg(Arg::positional("values").variadic().value(ValueKind::Float))
        .to_schema()
        .unwrap();
    let r = floats.run_inner(Args::from(&["-1.5"])).unwrap();
    assert_eq!(r.bindings().get_all::<f64>("values"), [-1.5]);
}

#[test]
fn declared_digit_flags_take_precedence_over_numbers() {
    let schema = Command::new("app")
        .arg(Arg::flag("four").short('4'))
        .arg(Arg::flag("six").short('6'))
        .arg(Arg::positional("values").variadic().int().optional())
        .to_schema()
        .unwrap();

    let r = schema.run_inner(Args::from(&["-46"])).unwrap();
    assert!(r.bindings().flag("four"));
    assert!(r.bindings().flag("six"));
    assert!(r.bindings().get_all::<i64>("values").is_empty());

    // -16 cannot decompose: -1 is not a declared flag
    let r = schema.run_inner(Args::from(&["-16"])).unwrap();
    assert_eq!(r.bindings().get_all::<i64>("values"), [-16]);
}

#[test]
fn help_rendering_is_a_pure_function_of_the_schema() {
    let schema = math();
    let before = schema.render_help();
    let _ = schema.run_inner(Args::from(&["add", "1", "2"])).unwrap();
    let _ = schema.run_inner(Args::from(&["--nonsense"])).unwrap_err();
    let after = schema.render_help();
    assert_eq!(before, after);

    let from_flag = schema
        .run_inner(Args::from(&["--help"]))
        .unwrap_err()
        .unwrap_stdout();
    assert_eq!(before, from_flag);
}

#[test]
fn counter_flag_counts_occurrences() {
    let schema = Command::new("app")
        .arg(Arg::counter("verbose").short('v'))
        .to_schema()
        .unwrap();

    let r = schema.run_inner(Args::from(&["-v", "-v", "-v"])).unwrap();
    assert_eq!(r.bindings().count("verbose"), 3);

    let r = schema.run_inner(Args::from(&["-vvv"])).unwrap();
    assert_eq!(r.bindings().count("verbose"), 3);
}

#[test]
fn selector_flag_binds_the_matched_case() {
    let schema = Command::new("app")
        .arg(Arg::selector("format", &["json", "yaml", "text"]))
        .to_schema()
        .unwrap();

    let r = schema.run_inner(Args::from(&["--yaml"])).unwrap();
    assert_eq!(r.bindings().get::<String>("format").as_deref(), Some("yaml"));

    // exclusivity applies across cases, last one wins by default
    let r = schema.run_inner(Args::from(&["--json", "--text"])).unwrap();
    assert_eq!(r.bindings().get::<String>("format").as_deref(), Some("text"));
}

#[test]
fn selector_array_appends_every_occurrence() {
    let schema = Command::new("app")
        .arg(Arg::selector("format", &["json", "yaml"]).variadic())
        .to_schema()
        .unwrap();

    let r = schema
        .run_inner(Args::from(&["--yaml", "--json", "--yaml"]))
        .unwrap();
    assert_eq!(
        r.bindings().get_all::<String>("format"),
        ["yaml", "json", "yaml"]
    );
}

#[test]
fn environment_fallback_and_precedence() {
    let schema = Command::new("app")
        .arg(Arg::option("token").env("APP_TOKEN").optional())
        .arg(Arg::flag("debug").env("APP_DEBUG"))
        .to_schema()
        .unwrap();

    let r = schema
        .run_inner(Args::from(&[]).with_env([("APP_TOKEN", "from-env"), ("APP_DEBUG", "")]))
        .unwrap();
    assert_eq!(r.bindings().get::<String>("token").as_deref(), Some("from-env"));
    assert_eq!(r.bindings().source("token"), BindingSource::Environment);
    // a present key selects the flag even with an empty value
    assert!(r.bindings().flag("debug"));

    let r = schema
        .run_inner(Args::from(&["--token", "from-cli"]).with_env([("APP_TOKEN", "from-env")]))
        .unwrap();
    assert_eq!(r.bindings().get::<String>("token").as_deref(), Some("from-cli"));
    assert_eq!(r.bindings().source("token"), BindingSource::CommandLine);
}

#[test]
fn missing_required_argument() {
    let schema = Command::new("app").arg(Arg::option("name")).to_schema().unwrap();
    let err = schema.run_inner(Args::from(&[])).unwrap_err().unwrap_stderr();
    assert_eq!(
        err,
        "missing required argument: `--name`\nUsage: app --name <NAME>"
    );
}

#[test]
fn unknown_option_suggests_a_fix() {
    let schema = Command::new("app").arg(Arg::flag("quiet")).to_schema().unwrap();
    let err = schema
        .run_inner(Args::from(&["--qiet"]))
        .unwrap_err()
        .unwrap_stderr();
    #[cfg(feature = "suggestions")]
    assert_eq!(
        err,
        "no such option: `--qiet`, did you mean `--quiet`?\nUsage: app [--quiet]"
    );
    #[cfg(not(feature = "suggestions"))]
    assert_eq!(err, "no such option: `--qiet`\nUsage: app [--quiet]");
}

#[test]
fn decode_errors_are_precise() {
    let schema = Command::new("app")
        .arg(Arg::option("port").value(ValueKind::Int { min: 1, max: 65535 }))
        .to_schema()
        .unwrap();

    let err = schema
        .run_inner(Args::from(&["--port", "zero"]))
        .unwrap_err()
        .unwrap_stderr();
    assert_eq!(
        err,
        "couldn't parse `zero` for `PORT`: expected an integer\nUsage: app --port <PORT>"
    );

    let err = schema
        .run_inner(Args::from(&["--port", "70000"]))
        .unwrap_err()
        .unwrap_stderr();
    assert_eq!(
        err,
        "value `70000` for `PORT` is out of range 1..=65535\nUsage: app --port <PORT>"
    );
}

#[cfg(unix)]
#[test]
fn invalid_unicode_value_is_a_decode_error() {
    use std::ffi::OsString;
    use std::os::unix::ffi::OsStringExt;

    let schema = Command::new("app").arg(Arg::option("name")).to_schema().unwrap();

    // the name still resolves, only the value fails to decode
    let tokens = vec![OsString::from_vec(b"--name=\xff".to_vec())];
    let err = schema
        .run_inner(Args::from(tokens.as_slice()))
        .unwrap_err()
        .unwrap_stderr();
    assert_eq!(
        err,
        "couldn't decode token 0 for `NAME`: invalid unicode at byte 0\nUsage: app --name <NAME>"
    );

    // a following value reports its own token and the byte offset of
    // the first undecodable unit
    let tokens = vec![
        OsString::from("--name"),
        OsString::from_vec(b"ok\xffrest".to_vec()),
    ];
    let err = schema
        .run_inner(Args::from(tokens.as_slice()))
        .unwrap_err()
        .unwrap_stderr();
    assert_eq!(
        err,
        "couldn't decode token 1 for `NAME`: invalid unicode at byte 2\nUsage: app --name <NAME>"
    );
}

#[test]
fn transform_failures_quote_the_raw_input() {
    let schema = Command::new("app")
        .arg(Arg::option("level").transform(|raw| match raw {
            "low" | "high" => Ok(Value::Str(raw.to_string())),
            _ => Err("expected low or high".to_string()),
        }))
        .to_schema()
        .unwrap();

    let r = schema.run_inner(Args::from(&["--level", "low"])).unwrap();
    assert_eq!(r.bindings().get::<String>("level").as_deref(), Some("low"));

    let err = schema
        .run_inner(Args::from(&["--level", "medium"]))
        .unwrap_err()
        .unwrap_stderr();
    assert_eq!(
        err,
        "couldn't parse `medium` for `LEVEL`: expected low or high\nUsage: app --level <LEVEL>"
    );
}

#[test]
fn validation_hooks_run_and_may_mutate() {
    let schema = Command::new("app")
        .arg(Arg::option("name"))
        .validate(|bindings| {
            let name: String = bindings.get("name").unwrap_or_default();
            if name.is_empty() {
                return Err(Violation::validation("name must not be empty"));
            }
            bindings.set("name", Value::Str(name.to_uppercase()));
            Ok(())
        })
        .to_schema()
        .unwrap();

    let r = schema.run_inner(Args::from(&["--name", "alpha"])).unwrap();
    assert_eq!(r.bindings().get::<String>("name").as_deref(), Some("ALPHA"));

    let err = schema
        .run_inner(Args::from(&["--name", ""]))
        .unwrap_err()
        .unwrap_stderr();
    assert_eq!(err, "name must not be empty\nUsage: app --name <NAME>");
}

#[test]
fn violation_variants_map_to_exit_behavior() {
    let domain = Command::new("app")
        .arg(Arg::flag("go"))
        .validate(|_| Err(Violation::domain("backend unreachable")))
        .to_schema()
        .unwrap();
    let failure = domain.run_inner(Args::from(&["--go"])).unwrap_err();
    assert_eq!(failure.exit_code(), 1);
    assert_eq!(failure.unwrap_stderr(), "backend unreachable");

    let silent = Command::new("app")
        .arg(Arg::flag("go"))
        .validate(|_| Err(Violation::Exit(3)))
        .to_schema()
        .unwrap();
    let failure = silent.run_inner(Args::from(&["--go"])).unwrap_err();
    assert_eq!(failure, ParseFailure::Silent(3));

    let clean = Command::new("app")
        .arg(Arg::flag("go"))
        .validate(|_| Err(Violation::CleanExit(Some("done".to_string()))))
        .to_schema()
        .unwrap();
    let failure = clean.run_inner(Args::from(&["--go"])).unwrap_err();
    assert_eq!(failure.exit_code(), 0);
    assert_eq!(failure.unwrap_stdout(), "done\n");
}

#[test]
fn version_flag_is_a_clean_exit() {
    let schema = Command::new("app")
        .version("1.4.2")
        .arg(Arg::flag("go"))
        .to_schema()
        .unwrap();
    let out = schema
        .run_inner(Args::from(&["--version"]))
        .unwrap_err()
        .unwrap_stdout();
    assert_eq!(out, "1.4.2\n");
}

#[test]
fn help_pseudo_subcommand_addresses_nested_commands() {
    let schema = math();
    let out = schema
        .run_inner(Args::from(&["help", "stats", "average"]))
        .unwrap_err()
        .unwrap_stdout();
    assert!(out.contains("USAGE: math stats average"));

    let err = schema
        .run_inner(Args::from(&["help", "nonsense"]))
        .unwrap_err()
        .unwrap_stderr();
    assert!(err.starts_with("no such subcommand: `nonsense`"));
}

#[test]
fn default_subcommand_replays_unclaimed_values() {
    let schema = Command::new("math")
        .command(Command::new("add").arg(Arg::positional("values").variadic().int()))
        .command(Command::new("noop"))
        .default_command("add")
        .to_schema()
        .unwrap();

    // explicit child still wins
    let r = schema.run_inner(Args::from(&["add", "1"])).unwrap();
    assert_eq!(r.command(), "add");

    // unclaimed values replay against the default child
    let r = schema.run_inner(Args::from(&["4", "5"])).unwrap();
    assert_eq!(r.command(), "add");
    assert_eq!(r.bindings().get_all::<i64>("values"), [4, 5]);
}

#[test]
fn parent_reference_must_name_an_ancestor() {
    let good = Command::new("app")
        .arg(Arg::flag("verbose"))
        .command(Command::new("run").parent("app"))
        .to_schema()
        .unwrap();
    let r = good.run_inner(Args::from(&["--verbose", "run"])).unwrap();
    assert!(r.bindings().flag("verbose"));

    let bad = Command::new("app")
        .command(Command::new("run").parent("other"))
        .to_schema()
        .unwrap();
    let err = bad.run_inner(Args::from(&["run"])).unwrap_err().unwrap_stderr();
    assert!(err.starts_with("command `run` refers to `other`"));
}

#[test]
fn dos_convention_parses_slash_names() {
    let schema = Command::new("app")
        .arg(Arg::option("full_name"))
        .arg(Arg::flag("verbose").short('v'))
        .to_schema()
        .unwrap()
        .with_settings(Settings {
            convention: Some(Convention::Dos),
        });

    let r = schema
        .run_inner(Args::from(&["/FullName:alice", "/V"]))
        .unwrap();
    assert_eq!(r.bindings().get::<String>("full_name").as_deref(), Some("alice"));
    assert!(r.bindings().flag("verbose"));
}

#[test]
fn opencli_dump_has_the_contract_shape() {
    let schema = math();
    let out = schema
        .run_inner(Args::from(&["--help-dump-opencli-v0.1"]))
        .unwrap_err()
        .unwrap_stdout();
    let doc: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(doc["opencli"], "0.1");
    assert_eq!(doc["info"]["title"], "math");
    assert_eq!(doc["info"]["summary"], "A math utility");
    let commands = doc["commands"].as_array().unwrap();
    assert!(commands.iter().any(|c| c["name"] == "add"));
}

#[test]
fn completion_mode_emits_candidates() {
    let schema = math();
    let out = schema
        .run_inner(Args::from(&["--argot-complete", "a"]))
        .unwrap_err()
        .unwrap_stdout();
    assert_eq!(out, "add\n");
}
