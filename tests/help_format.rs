use argot::*;

#[test]
fn basic_help_screen() {
    let schema = Command::new("math")
        .summary("A math utility")
        .arg(Arg::option("name").help("Target name"))
        .arg(Arg::positional("files").variadic().help("Files to read"))
        .to_schema()
        .unwrap();

    let help = schema
        .run_inner(Args::from(&["--help"]))
        .unwrap_err()
        .unwrap_stdout();
    let expected = "\
OVERVIEW: A math utility

USAGE: math --name <NAME> <FILES> ...

ARGUMENTS:
  <FILES> ...  Files to read

OPTIONS:
  --name <NAME>  Target name
  -h, --help     Show help information.
";
    assert_eq!(expected, help);
}

#[test]
fn subcommand_listing_with_aliases_and_default_marker() {
    let schema = Command::new("vcs")
        .summary("Version control")
        .command(Command::new("add").alias("a").summary("Add files"))
        .command(Command::new("commit").summary("Record changes"))
        .command(Command::new("internal").no_display())
        .default_command("commit")
        .to_schema()
        .unwrap();

    let help = schema
        .run_inner(Args::from(&["--help"]))
        .unwrap_err()
        .unwrap_stdout();
    let expected = "\
OVERVIEW: Version control

USAGE: vcs [<subcommand>]

OPTIONS:
  -h, --help  Show help information.

SUBCOMMANDS:
  add, a            Add files
  commit (default)  Record changes

  See 'vcs help <subcommand>' for detailed help.
";
    assert_eq!(expected, help);
}

#[test]
fn hidden_arguments_need_the_hidden_variant() {
    let schema = Command::new("app")
        .arg(Arg::flag("debug").hide().help("Internal debug switch"))
        .arg(Arg::flag("secret").private())
        .arg(Arg::flag("force").help("Force the operation"))
        .to_schema()
        .unwrap();

    let help = schema
        .run_inner(Args::from(&["--help"]))
        .unwrap_err()
        .unwrap_stdout();
    assert!(!help.contains("--debug"));
    assert!(!help.contains("--secret"));
    assert!(help.contains("--force"));

    let hidden = schema
        .run_inner(Args::from(&["--help-hidden"]))
        .unwrap_err()
        .unwrap_stdout();
    assert!(hidden.contains("--debug"));
    assert!(hidden.contains("Internal debug switch"));
    // private stays invisible even here
    assert!(!hidden.contains("--secret"));
}

#[test]
fn titled_groups_render_as_their_own_block() {
    let schema = Command::new("app")
        .arg(Arg::flag("force").help("Force"))
        .group(
            Group::titled("Output options")
                .arg(Arg::option("color").optional().help("When to use color"))
                .arg(Arg::flag("quiet").help("Say nothing")),
        )
        .to_schema()
        .unwrap();

    let help = schema
        .run_inner(Args::from(&["--help"]))
        .unwrap_err()
        .unwrap_stdout();
    let block = "\
Output options:
  --color <COLOR>  When to use color
  --quiet          Say nothing
";
    assert!(help.contains(block), "got: {}", help);
    // grouped arguments do not repeat in the general section
    let options_section = help.split("Output options:").next().unwrap();
    assert!(!options_section.contains("--color"));
}

#[test]
fn discussion_follows_the_summary() {
    let schema = Command::new("app")
        .summary("One line")
        .discussion("A much longer explanation\nspanning lines.")
        .arg(Arg::flag("x"))
        .to_schema()
        .unwrap();

    let help = schema
        .run_inner(Args::from(&["--help"]))
        .unwrap_err()
        .unwrap_stdout();
    assert!(help.starts_with(
        "OVERVIEW: One line\n\nA much longer explanation\nspanning lines.\n\nUSAGE:"
    ));
}

#[test]
fn env_and_default_annotations() {
    let schema = Command::new("app")
        .arg(
            Arg::option("token")
                .env("APP_TOKEN")
                .fallback(Value::Str("anon".to_string()))
                .help("API token"),
        )
        .to_schema()
        .unwrap();

    let help = schema
        .run_inner(Args::from(&["--help"]))
        .unwrap_err()
        .unwrap_stdout();
    assert!(
        help.contains("API token [env: APP_TOKEN] (default: anon)"),
        "got: {}",
        help
    );
}

#[test]
fn inverted_flags_show_both_spellings() {
    let schema = Command::new("app")
        .arg(Arg::flag("color").invertible(Inversion::PrefixedNo).help("Colors"))
        .arg(
            Arg::flag("net")
                .invertible(Inversion::PrefixedEnableDisable)
                .help("Networking"),
        )
        .to_schema()
        .unwrap();

    let help = schema
        .run_inner(Args::from(&["--help"]))
        .unwrap_err()
        .unwrap_stdout();
    assert!(help.contains("--color/--no-color"), "got: {}", help);
    assert!(help.contains("--enable-net/--disable-net"), "got: {}", help);
}

#[test]
fn selector_cases_each_get_a_row() {
    let schema = Command::new("app")
        .arg(Arg::selector("format", &["json", "yaml"]).help("Output format"))
        .to_schema()
        .unwrap();

    let help = schema
        .run_inner(Args::from(&["--help"]))
        .unwrap_err()
        .unwrap_stdout();
    assert!(help.contains("--json"));
    assert!(help.contains("--yaml"));
    assert!(help.contains("Output format"));
}

#[test]
fn usage_override_is_verbatim_with_substitution() {
    let schema = Command::new("app")
        .usage("{usage} FILE...")
        .arg(Arg::flag("force"))
        .to_schema()
        .unwrap();

    let help = schema
        .run_inner(Args::from(&["--help"]))
        .unwrap_err()
        .unwrap_stdout();
    assert!(help.contains("USAGE: app [--force] FILE..."));
}

#[test]
fn long_help_text_wraps_with_a_hanging_indent() {
    let long_help = "word ".repeat(30);
    let schema = Command::new("app")
        .arg(Arg::flag("x").help(long_help.trim().to_string()))
        .to_schema()
        .unwrap();

    let help = schema
        .run_inner(Args::from(&["--help"]))
        .unwrap_err()
        .unwrap_stdout();
    let lines: Vec<&str> = help.lines().collect();
    let first = lines.iter().position(|l| l.contains("--x")).unwrap();
    // continuation lines align under the help column
    assert!(lines[first + 1].starts_with("    "));
    assert!(lines.iter().all(|l| l.chars().count() <= 80), "got: {}", help);
}
