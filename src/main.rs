//! Weapon Balance Analytics CLI.

use clap::{Args, Parser, Subcommand};
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;
use strum::IntoEnumIterator;
use weapon_balance::config::{load_weights_file, Preset, RunConfig, ScoreWeights};
use weapon_balance::metrics::{MetricKey, REGISTRY};
use weapon_balance::model::load_weapons_csv;
use weapon_balance::pipeline::{
    recompute, weapon_detail, Controls, PipelineOutput, PipelineState, ScoredWeapon, SortDir,
    SortKey, SortSpec,
};
use weapon_balance::report::{write_html_report, write_json_report};
use weapon_balance::util::init_logging;

#[derive(Parser)]
#[command(name = "weapon-balance")]
#[command(
    about = "Weapon Balance Analytics (Derived Metrics + Weighted Scoring + Population Rankings)"
)]
struct Cli {
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Data source and control selections shared by `score` and `weapon`.
#[derive(Args, Clone)]
struct ControlArgs {
    #[arg(long, value_name = "CSV")]
    data: Option<PathBuf>,
    #[arg(long, value_name = "TOML", help = "Run configuration; flags override its values")]
    config: Option<PathBuf>,
    #[arg(long, help = "Armor tier: 0, L, M or H")]
    armor: Option<String>,
    #[arg(long, help = "Hit zone: Head, Body, Leg or Overall")]
    zone: Option<String>,
    #[arg(long, help = "Category name or All")]
    category: Option<String>,
    #[arg(long, help = "Case-insensitive Name substring")]
    search: Option<String>,
    #[arg(long, help = "Weight preset: META, CQC, MID or LONG")]
    preset: Option<String>,
    #[arg(
        long,
        value_name = "TOML",
        help = "Custom weights file with ttk/sustain/handling/range/reload/armor keys"
    )]
    weights: Option<PathBuf>,
    #[arg(long, help = "Sort key, e.g. Score, TTK, Name, RoleDom")]
    sort: Option<String>,
    #[arg(long, help = "Sort direction: asc or desc")]
    dir: Option<String>,
    #[arg(long, help = "Chart metric: score or ttk")]
    chart: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Score every weapon in the table, print the ranking and optionally write reports.
    Score {
        #[command(flatten)]
        controls: ControlArgs,
        #[arg(long, value_name = "DIR")]
        out: Option<PathBuf>,
        #[arg(long, default_value_t = 25)]
        limit: usize,
    },
    /// Print the detail breakdown for one weapon (by name).
    Weapon {
        #[command(flatten)]
        controls: ControlArgs,
        name: String,
    },
    /// Print the built-in weight presets.
    Presets,
}

fn main() -> Result<(), String> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Score {
            controls,
            out,
            limit,
        } => run_score(controls, out, limit),
        Commands::Weapon { controls, name } => run_weapon(controls, name),
        Commands::Presets => {
            print_presets();
            Ok(())
        }
    }
}

/// Everything needed for one run, with flags layered over the config file.
struct Run {
    state: PipelineState,
    out_dir: Option<PathBuf>,
}

fn prepare(args: ControlArgs) -> Result<Run, String> {
    let cfg = match &args.config {
        Some(path) => RunConfig::load(path).map_err(|e| e.to_string())?,
        None => RunConfig::default(),
    };
    let data = args
        .data
        .clone()
        .or_else(|| cfg.data.clone())
        .ok_or("provide --data or set data in --config")?;
    if !data.is_file() {
        return Err(format!("data file does not exist: {}", data.display()));
    }

    let mut pairs = cfg.control_pairs();
    if args.preset.is_some() {
        // A preset flag replaces the file's weights as well as its preset.
        pairs.retain(|(key, _)| !key.starts_with("w_"));
    }
    let flags = [
        ("armor", &args.armor),
        ("zone", &args.zone),
        ("category", &args.category),
        ("search", &args.search),
        ("preset", &args.preset),
        ("chartMetric", &args.chart),
    ];
    for (key, value) in flags {
        if let Some(v) = value {
            pairs.push((key.to_string(), v.clone()));
        }
    }
    if let Some(path) = &args.weights {
        let w = load_weights_file(path).map_err(|e| e.to_string())?;
        for (name, value) in ScoreWeights::NAMES.iter().zip(w.as_array()) {
            pairs.push((format!("w_{}", name), value.to_string()));
        }
        tracing::info!("using custom weights from {}", path.display());
    }
    let controls = Controls::from_pairs(pairs).map_err(|e| e.to_string())?;

    let sort = match args.sort.as_deref().or(cfg.sort.as_deref()) {
        Some(key) => {
            let key = SortKey::from_str(key).map_err(|_| format!("unknown sort key: {}", key))?;
            let dir = match args.dir.as_deref().or(cfg.sort_dir.as_deref()) {
                Some(d) => SortDir::from_str(d)
                    .map_err(|_| format!("unknown sort direction: {}", d))?,
                None => key.initial_dir(),
            };
            SortSpec::new(key, dir)
        }
        None => SortSpec::default(),
    };

    let dataset = load_weapons_csv(&data).map_err(|e| e.to_string())?;
    tracing::info!(
        "loaded {} weapon(s) from {} ({} warning(s))",
        dataset.records.len(),
        data.display(),
        dataset.warnings.len()
    );
    Ok(Run {
        state: PipelineState::new(dataset.records, controls, sort),
        out_dir: cfg.out_dir,
    })
}

fn run_score(args: ControlArgs, out: Option<PathBuf>, limit: usize) -> Result<(), String> {
    let run = prepare(args)?;
    let output = recompute(&run.state);
    print_ranking(&output, limit);

    if let Some(dir) = out.or(run.out_dir) {
        fs::create_dir_all(&dir).map_err(|e| e.to_string())?;
        let json_path = dir.join("report.json");
        write_json_report(&output, &run.state.controls, &json_path).map_err(|e| e.to_string())?;
        let html_dir = dir.join("html");
        write_html_report(&output, &run.state.controls, &html_dir).map_err(|e| e.to_string())?;
        tracing::info!("wrote {} and {}", json_path.display(), html_dir.display());
    }
    Ok(())
}

fn run_weapon(args: ControlArgs, name: String) -> Result<(), String> {
    let run = prepare(args)?;
    let output = recompute(&run.state);
    match weapon_detail(&output, &name) {
        Some(row) => {
            print_weapon(row, &output);
            Ok(())
        }
        None => Err(format!("weapon not found in working set: {}", name)),
    }
}

fn fmt_opt(v: Option<f64>, decimals: usize) -> String {
    match v {
        Some(v) => format!("{:.*}", decimals, v),
        None => "-".to_string(),
    }
}

fn print_ranking(output: &PipelineOutput, limit: usize) {
    println!(
        "{} | {}",
        output.validation.ok_text(),
        output.validation.missing_text()
    );
    println!("{}", output.status_text());
    println!(
        "\n{:>3}  {:<24} {:<12} {:>6} {:>7} {:>7} {:>6} {:>8}",
        "#", "Weapon", "Category", "Score", "Role%", "Counter", "TTK", "Sustain"
    );
    for (i, r) in output.rows.iter().take(limit).enumerate() {
        let flag = match (r.role_dominance_top10, r.outlier_warning) {
            (_, true) => " !",
            (true, false) => " *",
            _ => "",
        };
        println!(
            "{:>3}  {:<24} {:<12} {:>6} {:>7} {:>7} {:>6} {:>8}{}",
            i + 1,
            r.record.name,
            r.record.category,
            fmt_opt(r.score, 1),
            fmt_opt(r.role_dominance_index, 1),
            fmt_opt(r.counter_score, 1),
            fmt_opt(r.ttk(), 2),
            fmt_opt(r.raw.get(MetricKey::Sustain), 1),
            flag
        );
    }
    if output.rows.len() > limit {
        println!("  … {} more", output.rows.len() - limit);
    }
}

fn print_weapon(r: &ScoredWeapon, output: &PipelineOutput) {
    let ctx = &output.context;
    println!("Weapon: {} ({})", r.record.name, r.record.category);
    println!("Context: armor {} zone {}", ctx.armor, ctx.zone);
    println!(
        "Score: {}  Role dominance: {}%{}  Outlier: {}σ{}",
        fmt_opt(r.score, 1),
        fmt_opt(r.role_dominance_index, 1),
        if r.role_dominance_top10 { " (top 10%)" } else { "" },
        fmt_opt(r.outlier_index, 2),
        if r.outlier_warning { " (spike)" } else { "" }
    );
    println!(
        "Counter: {} rank {}%  Skill floor: {}  Skill ceiling: {}",
        fmt_opt(r.counter_score, 1),
        fmt_opt(r.counter_rank, 1),
        fmt_opt(r.skill_floor, 1),
        fmt_opt(r.skill_ceiling, 1)
    );
    println!("\nMetrics (raw / normalized):");
    for d in REGISTRY.iter() {
        println!(
            "  {:<22} {:>10} {:>6}",
            d.label,
            fmt_opt(r.raw.get(d.key), 3),
            fmt_opt(r.normalized.get(d.key), 3)
        );
    }
    println!(
        "  {:<22} {:>10} {:>6}",
        "Consistency",
        "",
        fmt_opt(r.normalized.consistency, 3)
    );
    let bp = &r.raw.breakpoint;
    println!(
        "\nArmor breakpoints (Body): ΔL {}  ΔM {}  ΔH {}  avg {}",
        fmt_opt(bp.delta_l, 2),
        fmt_opt(bp.delta_m, 2),
        fmt_opt(bp.delta_h, 2),
        fmt_opt(bp.avg, 2)
    );
    println!("\nDistance bands:");
    for (band, score) in r.distance_bands.iter() {
        println!("  {:<6} {}", band, fmt_opt(score, 1));
    }
    println!("\nFlags:");
    let mut any = false;
    for (on, text) in [
        (r.head_dep_high, "High headshot dependency"),
        (r.raw.reloads_every_kill, "Reloads every kill"),
        (r.outlier_warning, "Score spike within category"),
    ] {
        if on {
            println!("  {}", text);
            any = true;
        }
    }
    if !any {
        println!("  None");
    }
}

fn print_presets() {
    println!(
        "{:<8} {:>5} {:>8} {:>9} {:>6} {:>7} {:>6}",
        "Preset", "ttk", "sustain", "handling", "range", "reload", "armor"
    );
    for preset in Preset::iter().filter(|p| *p != Preset::Custom) {
        let w = preset.weights();
        println!(
            "{:<8} {:>5} {:>8} {:>9} {:>6} {:>7} {:>6}",
            preset.to_string(),
            w.ttk,
            w.sustain,
            w.handling,
            w.range,
            w.reload,
            w.armor
        );
    }
}
