use argot::*;
use serde_json::Value as Json;

fn dump(schema: &Schema) -> Json {
    let out = schema
        .run_inner(Args::from(&["--help-dump-opencli-v0.1"]))
        .unwrap_err()
        .unwrap_stdout();
    serde_json::from_str(&out).unwrap()
}

#[test]
fn top_level_shape() {
    let schema = Command::new("tool")
        .version("2.0.1")
        .summary("Does things")
        .discussion("At length.")
        .arg(Arg::flag("verbose"))
        .to_schema()
        .unwrap();

    let doc = dump(&schema);
    assert_eq!(doc["opencli"], "0.1");
    assert_eq!(doc["info"]["title"], "tool");
    assert_eq!(doc["info"]["version"], "2.0.1");
    assert_eq!(doc["info"]["summary"], "Does things");
    assert_eq!(doc["info"]["description"], "At length.");
}

#[test]
fn option_descriptors_carry_names_aliases_and_values() {
    let schema = Command::new("tool")
        .arg(
            Arg::option("output")
                .short('o')
                .help("Where to write")
                .fallback(Value::Str("out.txt".to_string())),
        )
        .to_schema()
        .unwrap();

    let doc = dump(&schema);
    let options = doc["options"].as_array().unwrap();
    assert_eq!(options.len(), 1);
    let output = &options[0];
    assert_eq!(output["name"], "--output");
    assert_eq!(output["aliases"], serde_json::json!(["-o"]));
    assert_eq!(output["description"], "Where to write");
    assert_eq!(output["arguments"][0]["name"], "OUTPUT");
    assert_eq!(output["arguments"][0]["default"], "out.txt");
}

#[test]
fn custom_flags_mark_repetition_and_path_hints() {
    let schema = Command::new("tool")
        .arg(Arg::option("include").strategy(Strategy::SingleValue))
        .arg(Arg::option("log").complete(CompletionHint::File { ext: Some("log") }))
        .arg(Arg::option("dir").complete(CompletionHint::Dir))
        .to_schema()
        .unwrap();

    let doc = dump(&schema);
    let options = doc["options"].as_array().unwrap();
    assert_eq!(options[0]["swiftArgumentParserRepeating"], true);
    assert!(options[1]["swiftArgumentParserRepeating"].is_null());
    assert_eq!(options[1]["swiftArgumentParserFile"], true);
    assert_eq!(options[2]["swiftArgumentParserDirectory"], true);
}

#[test]
fn positionals_and_nested_commands() {
    let schema = Command::new("tool")
        .arg(Arg::positional("input").help("Input file"))
        .command(
            Command::new("convert")
                .alias("c")
                .summary("Convert things")
                .arg(Arg::positional("files").variadic()),
        )
        .to_schema()
        .unwrap();

    let doc = dump(&schema);
    let args = doc["arguments"].as_array().unwrap();
    assert_eq!(args[0]["name"], "INPUT");
    assert_eq!(args[0]["description"], "Input file");
    assert_eq!(args[0]["required"], true);

    let commands = doc["commands"].as_array().unwrap();
    assert_eq!(commands[0]["name"], "convert");
    assert_eq!(commands[0]["aliases"], serde_json::json!(["c"]));
    assert_eq!(commands[0]["summary"], "Convert things");
    let nested_args = commands[0]["arguments"].as_array().unwrap();
    assert_eq!(nested_args[0]["swiftArgumentParserRepeating"], true);
}

#[test]
fn private_arguments_are_left_out() {
    let schema = Command::new("tool")
        .arg(Arg::flag("public"))
        .arg(Arg::flag("secret").private())
        .to_schema()
        .unwrap();

    let doc = dump(&schema);
    let options = doc["options"].as_array().unwrap();
    assert_eq!(options.len(), 1);
    assert_eq!(options[0]["name"], "--public");
}

#[test]
fn dump_is_stable_across_invocations() {
    let schema = Command::new("tool").arg(Arg::flag("x")).to_schema().unwrap();
    let first = schema
        .run_inner(Args::from(&["--help-dump-opencli-v0.1"]))
        .unwrap_err()
        .unwrap_stdout();
    let _ = schema.run_inner(Args::from(&["--x"])).unwrap();
    let second = schema
        .run_inner(Args::from(&["--help-dump-opencli-v0.1"]))
        .unwrap_err()
        .unwrap_stdout();
    assert_eq!(first, second);
}
