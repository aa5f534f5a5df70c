use argot::*;

fn tool() -> Schema {
    Command::new("mytool")
        .arg(Arg::flag("verbose").short('v'))
        .arg(
            Arg::option("format")
                .optional()
                .complete(CompletionHint::List(vec!["json", "yaml", "text"])),
        )
        .command(Command::new("build"))
        .command(Command::new("bench"))
        .command(Command::new("clean"))
        .to_schema()
        .unwrap()
}

fn complete(schema: &Schema, words: &[&str]) -> String {
    let mut tokens = vec!["--argot-complete"];
    tokens.extend_from_slice(words);
    schema
        .run_inner(Args::from(tokens.as_slice()))
        .unwrap_err()
        .unwrap_stdout()
}

#[test]
fn completion_failure_is_a_success_exit() {
    let schema = tool();
    let failure = schema
        .run_inner(Args::from(&["--argot-complete", "b"]))
        .unwrap_err();
    assert_eq!(failure.exit_code(), 0);
}

#[test]
fn subcommand_names_for_a_bare_prefix() {
    let schema = tool();
    assert_eq!(complete(&schema, &["b"]), "bench\nbuild\n");
    assert_eq!(complete(&schema, &["cl"]), "clean\n");
}

#[test]
fn option_names_for_a_dash_prefix() {
    let schema = tool();
    let out = complete(&schema, &["--"]);
    assert!(out.contains("--verbose\n"));
    assert!(out.contains("--format\n"));
    assert!(out.contains("--help\n"));
    assert!(!out.contains("-v\n"));
}

#[test]
fn list_hint_values_for_a_pending_option() {
    let schema = tool();
    assert_eq!(complete(&schema, &["--format", ""]), "json\ntext\nyaml\n");
    assert_eq!(complete(&schema, &["--format", "j"]), "json\n");
}

#[test]
fn custom_hint_runs_the_callback() {
    let schema = Command::new("app")
        .arg(Arg::option("branch").complete(CompletionHint::Custom(std::sync::Arc::new(
            |partial: &str| {
                ["main", "develop"]
                    .iter()
                    .filter(|b| b.starts_with(partial))
                    .map(|b| b.to_string())
                    .collect()
            },
        ))))
        .to_schema()
        .unwrap();

    let out = schema
        .run_inner(Args::from(&["--argot-complete", "--branch", "ma"]))
        .unwrap_err()
        .unwrap_stdout();
    assert_eq!(out, "main\n");
}

#[test]
fn scripts_reference_tool_and_protocol() {
    let schema = tool();
    for shell in [Shell::Bash, Shell::Zsh, Shell::Fish] {
        let script = schema.completion_script(shell);
        assert!(script.contains("mytool"), "{:?}", shell);
        assert!(script.contains("--argot-complete"), "{:?}", shell);
    }
}

#[test]
fn shell_names_parse() {
    assert_eq!("bash".parse::<Shell>(), Ok(Shell::Bash));
    assert_eq!("zsh".parse::<Shell>(), Ok(Shell::Zsh));
    assert_eq!("fish".parse::<Shell>(), Ok(Shell::Fish));
    assert!("powershell".parse::<Shell>().is_err());
}
