use std::fs;
use std::io::IsTerminal;
use std::path::Path;
use std::process;

use anstyle::{AnsiColor, Style};
use clap::{Parser, ValueEnum};

use rulewatch::engine;
use rulewatch::error::{exit_code, Result, RuleWatchError};
use rulewatch::model::Severity;
use rulewatch::problem::Problem;
use rulewatch::ruleset;
use rulewatch::settings::Settings;

#[derive(Parser, Debug)]
#[command(
    name = "rulewatch",
    version,
    about = "Pattern-based source-code security linter",
    long_about = None
)]
struct Args {
    /// Source file to analyze.
    #[arg(value_name = "FILE")]
    file: String,

    /// Language id to analyze as. Inferred from the file extension when omitted.
    #[arg(long, value_name = "LANG")]
    lang: Option<String>,

    /// Directory of JSON rule files to load.
    #[arg(long, value_name = "DIR", default_value = "sample-rules")]
    rules: String,

    /// Path to a settings TOML file. Defaults to ./rulewatch.toml if present.
    #[arg(long, value_name = "FILE")]
    settings: Option<String>,

    /// Enable BestPractice-severity rules.
    #[arg(long)]
    enable_best_practice: bool,

    /// Enable ManualReview-severity rules.
    #[arg(long)]
    enable_manual_review: bool,

    /// Rule ids to ignore, comma-separated. Merged with settings.
    #[arg(long, value_delimiter = ',')]
    ignore_rules: Vec<String>,

    /// Fail the rule-set load if any pattern is malformed.
    #[arg(long)]
    validate_rules: bool,

    /// Output format.
    #[arg(long, value_enum, default_value = "text")]
    format: FormatArg,

    /// Show a unified diff previewing the first fix of every finding,
    /// instead of listing findings. Never writes the file.
    #[arg(long)]
    diff: bool,

    /// Exit with code 10 if any live (non-WarningInfo) finding exists.
    #[arg(long)]
    fail: bool,

    /// Colorize text output. Auto-detects TTY when set to 'auto'.
    #[arg(long, value_enum, default_value = "auto")]
    color: ColorArg,
}

#[derive(ValueEnum, Debug, Clone, PartialEq)]
enum FormatArg {
    Text,
    Json,
}

#[derive(ValueEnum, Debug, Clone, PartialEq)]
enum ColorArg {
    Auto,
    Always,
    Never,
}

/// Language ids recognized by the comment delimiter table (spec.md §6),
/// keyed by common filename extension.
fn infer_lang_id(path: &str) -> String {
    let ext = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();
    let lang = match ext.as_str() {
        "c" | "h" => "c",
        "cpp" | "cc" | "cxx" | "hpp" => "cpp",
        "cs" => "csharp",
        "go" => "go",
        "java" => "java",
        "js" | "mjs" | "cjs" => "javascript",
        "jsx" => "javascriptreact",
        "ts" => "typescript",
        "tsx" => "typescriptreact",
        "py" => "python",
        "rb" => "ruby",
        "rs" => "rust",
        "php" => "php",
        "pl" | "pm" => "perl",
        "ps1" => "powershell",
        "sh" | "bash" => "shellscript",
        "sql" => "sql",
        "swift" => "swift",
        "lua" => "lua",
        "clj" => "clojure",
        "fs" | "fsi" | "fsx" => "fsharp",
        "yml" | "yaml" => "yaml",
        "html" | "htm" => "html",
        "xml" => "xml",
        "vb" => "vb",
        "r" => "r",
        "m" => "objective-c",
        "groovy" => "groovy",
        "jade" | "pug" => "jade",
        _ => "plaintext",
    };
    lang.to_string()
}

fn main() {
    let args = Args::parse();
    let fail_flag = args.fail;

    match run(args) {
        Ok(had_live_findings) => {
            if fail_flag && had_live_findings {
                process::exit(exit_code::FINDINGS);
            }
        }
        Err(e) => {
            eprintln!("rulewatch: {e}");
            let code = match &e {
                RuleWatchError::SettingsParse { .. }
                | RuleWatchError::SettingsInvalid(_)
                | RuleWatchError::RuleParse { .. }
                | RuleWatchError::RuleInvalid { .. } => exit_code::CONFIG_ERROR,
                _ => exit_code::IO_ERROR,
            };
            process::exit(code);
        }
    }
}

fn run(args: Args) -> Result<bool> {
    let mut settings = match &args.settings {
        Some(path) => Settings::load(Path::new(path))?,
        None => Settings::load_from_cwd()?.unwrap_or_default(),
    };
    settings.enable_best_practice_rules |= args.enable_best_practice;
    settings.enable_manual_review_rules |= args.enable_manual_review;
    settings.ignore_rules_list.extend(args.ignore_rules.iter().cloned());
    settings.validate_rules_files |= args.validate_rules;

    let rules = ruleset::load_dir(Path::new(&args.rules), settings.validate_rules_files)?;

    let meta = fs::metadata(&args.file).map_err(|source| RuleWatchError::FileRead {
        path: args.file.clone().into(),
        source,
    })?;
    const MAX_ANALYZED_BYTES: u64 = 64 * 1024 * 1024;
    if meta.len() > MAX_ANALYZED_BYTES {
        return Err(RuleWatchError::FileTooLarge {
            path: args.file.clone().into(),
        });
    }
    let content = fs::read_to_string(&args.file).map_err(|source| RuleWatchError::FileRead {
        path: args.file.clone().into(),
        source,
    })?;

    let lang_id = args.lang.clone().unwrap_or_else(|| infer_lang_id(&args.file));
    let today = time::OffsetDateTime::now_utc().date();

    let problems = engine::analyze(&rules, &content, &lang_id, &args.file, &settings, today);
    let had_live_findings = problems.iter().any(|p| p.severity != Severity::WarningInfo);

    let use_color = match args.color {
        ColorArg::Always => true,
        ColorArg::Never => false,
        ColorArg::Auto => std::io::stderr().is_terminal(),
    };

    if args.format == FormatArg::Json {
        let report = build_json_report(&problems, &args.file, &lang_id);
        let json = serde_json::to_string_pretty(&report).map_err(|e| RuleWatchError::FileWrite {
            path: "<stdout>".into(),
            source: std::io::Error::other(e.to_string()),
        })?;
        println!("{json}");
        return Ok(had_live_findings);
    }

    if args.diff {
        let previewed = preview_fixes(&content, &problems);
        let diff_output = rulewatch::diff::unified_diff(&content, &previewed, "original", "fixed-preview");
        if diff_output.is_empty() {
            eprintln!("rulewatch: no auto-fixable findings");
        } else {
            print!("{diff_output}");
        }
        return Ok(had_live_findings);
    }

    print_text_report(&problems, use_color);
    Ok(had_live_findings)
}

/// Apply the first fix of every finding that has one, isolated per problem
/// (not composed), purely to preview what fixing everything would look like.
/// This never writes the source file back — fix *application* is out of
/// scope (spec.md §1 Non-goals); this is a CLI preview only.
fn preview_fixes(content: &str, problems: &[Problem]) -> String {
    let mut lines: Vec<String> = content.lines().map(String::from).collect();

    let mut edits: Vec<(usize, usize, usize, &str)> = problems
        .iter()
        .filter_map(|p| p.fixes.first())
        .filter(|fix| fix.range.start.line == fix.range.end.line)
        .map(|fix| {
            (
                fix.range.start.line,
                fix.range.start.character,
                fix.range.end.character,
                fix.new_text.as_str(),
            )
        })
        .collect();

    // Two fixes can land on the same line; applying them left-to-right would
    // let the first one shift the line's length and invalidate the second
    // one's offsets. Sorting each line's edits by descending start column
    // applies the rightmost edit first, so earlier offsets on that line are
    // still valid when their turn comes.
    edits.sort_by(|a, b| a.0.cmp(&b.0).then(b.1.cmp(&a.1)));

    for (line_idx, start, end, new_text) in edits {
        let Some(line) = lines.get_mut(line_idx) else {
            continue;
        };
        if start > end || start > line.len() || end > line.len() {
            continue;
        }
        let mut new_line = String::with_capacity(line.len());
        new_line.push_str(&line[..start]);
        new_line.push_str(new_text);
        new_line.push_str(&line[end..]);
        *line = new_line;
    }

    let mut out = lines.join("\n");
    if content.ends_with('\n') {
        out.push('\n');
    }
    out
}

#[derive(serde::Serialize)]
struct JsonReport {
    version: &'static str,
    file: String,
    lang_id: String,
    findings: Vec<JsonFinding>,
    summary: JsonSummary,
}

#[derive(serde::Serialize)]
struct JsonFinding {
    rule_id: String,
    severity: Severity,
    start_line: usize,
    start_column: usize,
    end_line: usize,
    end_column: usize,
    message: String,
    fixes: Vec<String>,
    is_suppression_marker: bool,
}

#[derive(serde::Serialize)]
struct JsonSummary {
    total: usize,
    live: usize,
    suppressed: usize,
}

fn build_json_report(problems: &[Problem], file: &str, lang_id: &str) -> JsonReport {
    let findings: Vec<JsonFinding> = problems
        .iter()
        .map(|p| JsonFinding {
            rule_id: p.rule_id.clone(),
            severity: p.severity,
            start_line: p.range.start.line,
            start_column: p.range.start.character,
            end_line: p.range.end.line,
            end_column: p.range.end.character,
            message: p.message.clone(),
            fixes: p.fixes.iter().map(|f| f.label.clone()).collect(),
            is_suppression_marker: p.suppressed_finding_range.is_some(),
        })
        .collect();

    let suppressed = findings.iter().filter(|f| f.is_suppression_marker).count();
    JsonReport {
        version: env!("CARGO_PKG_VERSION"),
        file: file.to_string(),
        lang_id: lang_id.to_string(),
        summary: JsonSummary {
            total: findings.len(),
            live: findings.len() - suppressed,
            suppressed,
        },
        findings,
    }
}

const RESET: &str = "\x1b[0m";

fn severity_style(sev: Severity, color: bool) -> String {
    if !color {
        return String::new();
    }
    match sev {
        Severity::Critical => Style::new()
            .fg_color(Some(anstyle::Color::Ansi(AnsiColor::Red)))
            .bold()
            .render()
            .to_string(),
        Severity::Important => Style::new()
            .fg_color(Some(anstyle::Color::Ansi(AnsiColor::Yellow)))
            .bold()
            .render()
            .to_string(),
        Severity::Moderate => Style::new()
            .fg_color(Some(anstyle::Color::Ansi(AnsiColor::Yellow)))
            .render()
            .to_string(),
        Severity::BestPractice | Severity::ManualReview => String::new(),
        Severity::WarningInfo => Style::new()
            .fg_color(Some(anstyle::Color::Ansi(AnsiColor::Blue)))
            .render()
            .to_string(),
    }
}

fn severity_label(sev: Severity) -> &'static str {
    match sev {
        Severity::Critical => "CRITICAL",
        Severity::Important => "IMPORTANT",
        Severity::Moderate => "MODERATE",
        Severity::BestPractice => "BEST-PRACTICE",
        Severity::ManualReview => "MANUAL-REVIEW",
        Severity::WarningInfo => "SUPPRESSED",
    }
}

fn print_text_report(problems: &[Problem], color: bool) {
    if problems.is_empty() {
        eprintln!("rulewatch: no findings");
        return;
    }
    for p in problems {
        let style_start = severity_style(p.severity, color);
        let reset = if color { RESET } else { "" };
        println!(
            "{}{}:{}: [{}] {} ({}){}",
            style_start,
            p.range.start.line + 1,
            p.range.start.character + 1,
            p.rule_id,
            p.message,
            severity_label(p.severity),
            reset
        );
        if !p.fixes.is_empty() {
            let labels: Vec<&str> = p.fixes.iter().map(|f| f.label.as_str()).collect();
            println!("    fixes: {}", labels.join(", "));
        }
    }
    eprintln!("\n{} finding(s)", problems.len());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infer_lang_id_from_common_extensions() {
        assert_eq!(infer_lang_id("main.rs"), "rust");
        assert_eq!(infer_lang_id("app.py"), "python");
        assert_eq!(infer_lang_id("src/lib.c"), "c");
        assert_eq!(infer_lang_id("weird.xyz"), "plaintext");
    }

    #[test]
    fn preview_fixes_applies_first_fix_only() {
        let content = "strcpy(a, b);\n";
        let problem = Problem {
            rule_id: "DS001".into(),
            severity: Severity::Critical,
            range: rulewatch::problem::Range::new(
                rulewatch::problem::Position::new(0, 0),
                rulewatch::problem::Position::new(0, 6),
            ),
            message: String::new(),
            name: String::new(),
            recommendation: String::new(),
            rule_info: String::new(),
            fixes: vec![rulewatch::problem::FixEdit {
                label: "use strlcpy".into(),
                range: rulewatch::problem::Range::new(
                    rulewatch::problem::Position::new(0, 0),
                    rulewatch::problem::Position::new(0, 6),
                ),
                new_text: "strlcpy".into(),
            }],
            overrides: vec![],
            suppressed_finding_range: None,
        };
        let fixed = preview_fixes(content, &[problem]);
        assert_eq!(fixed, "strlcpy(a, b);\n");
    }

    #[test]
    fn preview_fixes_handles_two_fixes_on_the_same_line() {
        // Both fixes grow their replacement by one byte ("strcpy" -> "strlcpy");
        // applying the earlier one first would shift the second one's offsets.
        let content = "strcpy(a,b); strcpy(c,d);\n";
        fn make_problem(start: usize, end: usize) -> Problem {
            Problem {
                rule_id: "DS001".into(),
                severity: Severity::Critical,
                range: rulewatch::problem::Range::new(
                    rulewatch::problem::Position::new(0, start),
                    rulewatch::problem::Position::new(0, end),
                ),
                message: String::new(),
                name: String::new(),
                recommendation: String::new(),
                rule_info: String::new(),
                fixes: vec![rulewatch::problem::FixEdit {
                    label: "use strlcpy".into(),
                    range: rulewatch::problem::Range::new(
                        rulewatch::problem::Position::new(0, start),
                        rulewatch::problem::Position::new(0, end),
                    ),
                    new_text: "strlcpy".into(),
                }],
                overrides: vec![],
                suppressed_finding_range: None,
            }
        }
        let first = make_problem(0, 6);
        let second = make_problem(13, 19);
        let fixed = preview_fixes(content, &[first, second]);
        assert_eq!(fixed, "strlcpy(a,b); strlcpy(c,d);\n");
    }

    #[test]
    fn build_json_report_counts_suppressed_separately() {
        let live = Problem {
            rule_id: "DS1".into(),
            severity: Severity::Critical,
            range: rulewatch::problem::Range::new(
                rulewatch::problem::Position::new(0, 0),
                rulewatch::problem::Position::new(0, 1),
            ),
            message: String::new(),
            name: String::new(),
            recommendation: String::new(),
            rule_info: String::new(),
            fixes: vec![],
            overrides: vec![],
            suppressed_finding_range: None,
        };
        let mut marker = live.clone();
        marker.severity = Severity::WarningInfo;
        marker.suppressed_finding_range = Some(live.range);

        let report = build_json_report(&[live, marker], "f.c", "c");
        assert_eq!(report.summary.total, 2);
        assert_eq!(report.summary.live, 1);
        assert_eq!(report.summary.suppressed, 1);
    }
}
