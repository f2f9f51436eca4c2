use clap::Parser;
use comfy_table::Table;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing_subscriber::EnvFilter;

use gymbook::{
    filter_classes, load_snapshot, search_family, search_student, AppConfig, ClassFilter,
    EditKind, EntityStore, GymResult, LegacyStore, Reconciler, RecordType,
};

/// Gymbook admin console
#[derive(Parser, Debug)]
#[command(name = "gymbook")]
#[command(about = "Gymnastics school admin console", long_about = None)]
struct Args {
    /// Legacy store data directory
    #[arg(short, long)]
    data_dir: Option<String>,

    /// ETL snapshot directory
    #[arg(short, long)]
    snapshot_dir: Option<String>,

    /// School year being administered
    #[arg(short, long)]
    year: Option<i32>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let mut config = AppConfig::load();
    if let Some(d) = args.data_dir {
        config.data_dir = d;
    }
    if let Some(s) = args.snapshot_dir {
        config.snapshot_dir = s;
    }
    if let Some(y) = args.year {
        config.current_year = y;
    }

    println!("╔══════════════════════════════════════════════════════════╗");
    println!("║                 Gymbook Admin Console                    ║");
    println!("╠══════════════════════════════════════════════════════════╣");
    println!("║  Data Dir:     {:<41} ║", config.data_dir);
    println!("║  Snapshot Dir: {:<41} ║", config.snapshot_dir);
    println!("║  School Year:  {:<41} ║", config.current_year);
    println!("╚══════════════════════════════════════════════════════════╝");

    let mut store = load_snapshot(&config.snapshot_dir)?;
    let mut legacy = LegacyStore::open(&config.data_dir)?;
    println!("Loaded. Type 'help' for commands.\n");

    let mut rl = DefaultEditor::new()?;
    loop {
        match rl.readline("gymbook> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(line);
                if line == "quit" || line == "exit" {
                    break;
                }
                if let Err(e) = dispatch(line, &mut store, &mut legacy, &config) {
                    eprintln!("error: {e}");
                }
            }
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("readline error: {e}");
                break;
            }
        }
    }

    legacy.save()?;
    println!("Legacy store saved. Bye.");
    Ok(())
}

fn dispatch(
    line: &str,
    store: &mut EntityStore,
    legacy: &mut LegacyStore,
    config: &AppConfig,
) -> GymResult<()> {
    let mut parts = line.split_whitespace();
    let command = parts.next().unwrap_or_default();
    let rest: Vec<&str> = parts.collect();

    match command {
        "help" => {
            println!("  find <first> <last>       prefix search ('-' = any)");
            println!("  family <last-prefix>      family grouping search");
            println!("  classes [k=v ...]         filter: instructor gender level day");
            println!("  set <id> FIELD=VALUE ...  edit student fields");
            println!("  setclass <id> FIELD=VALUE ...  edit class fields");
            println!("  pay <id> FIELD=VALUE ...  payment-screen edit (MARPAY=45.00)");
            println!("  bill <id> <MON|REG> <yr>  toggle billed state");
            println!("  activate <id>             flip active flag");
            println!("  move <id> <from> <to>     move between classes");
            println!("  newstudent FIELD=VALUE .. create a student");
            println!("  save | quit");
        }
        "find" => {
            let first = rest.first().copied().unwrap_or("-");
            let last = rest.get(1).copied().unwrap_or("-");
            let wildcard = |s: &str| if s == "-" { String::new() } else { s.to_string() };
            let hits = search_student(store, &wildcard(first), &wildcard(last))?;
            let mut table = Table::new();
            table.set_header(["ID", "LAST", "FIRST", "PHONE", "BIRTHDAY", "ACTIVE"]);
            for h in hits {
                table.add_row([
                    h.student_id.to_string(),
                    h.last_name,
                    h.first_name,
                    h.phone,
                    h.birthday,
                    h.active.to_string(),
                ]);
            }
            println!("{table}");
        }
        "family" => {
            let hits = search_family(store, rest.first().copied().unwrap_or(""))?;
            let mut table = Table::new();
            table.set_header(["FAMILY", "LAST", "CHILDREN"]);
            for h in hits {
                table.add_row([
                    h.family_id.map_or_else(String::new, |id| id.to_string()),
                    h.last_name,
                    h.children.to_string(),
                ]);
            }
            println!("{table}");
        }
        "classes" => {
            let mut filter = ClassFilter::default();
            for (key, value) in rest.iter().filter_map(|p| p.split_once('=')) {
                match key {
                    "instructor" => filter.instructor = value.to_string(),
                    "gender" => filter.gender = value.to_string(),
                    "level" => filter.level = value.to_string(),
                    "day" => filter.day = value.to_string(),
                    _ => eprintln!("unknown filter '{key}'"),
                }
            }
            let hits = filter_classes(store, &filter)?;
            let mut table = Table::new();
            table.set_header(["ID", "DAY", "TIME", "CLASS", "INSTRUCTOR", "AVAIL/MAX"]);
            for h in hits {
                table.add_row([
                    h.class_id.to_string(),
                    h.day,
                    h.time,
                    h.classname,
                    h.instructor,
                    format!("{}/{}", h.available, h.max),
                ]);
            }
            println!("{table}");
        }
        "set" | "pay" => {
            let id = parse_id(rest.first())?;
            let edits = parse_edits(&rest[1..]);
            let kind = if command == "pay" {
                EditKind::Payment
            } else {
                EditKind::General
            };
            Reconciler::new(store, legacy, config.current_year)
                .update_student_info(id, &edits, kind, config.current_year)?;
            println!("updated");
        }
        "setclass" => {
            let id = parse_id(rest.first())?;
            let edits = parse_edits(&rest[1..]);
            Reconciler::new(store, legacy, config.current_year).update_class_info(id, &edits)?;
            println!("updated");
        }
        "bill" => {
            let id = parse_id(rest.first())?;
            let month = rest.get(1).copied().unwrap_or("");
            let year = rest
                .get(2)
                .and_then(|y| y.parse().ok())
                .unwrap_or(config.current_year);
            let billed = Reconciler::new(store, legacy, config.current_year)
                .bill_student(id, month, year)?;
            println!("billed: {billed}");
        }
        "activate" => {
            let id = parse_id(rest.first())?;
            let active = Reconciler::new(store, legacy, config.current_year)
                .activate_student(id)?;
            println!("active: {active}");
        }
        "move" => {
            let id = parse_id(rest.first())?;
            let from = parse_id(rest.get(1))?;
            let to = parse_id(rest.get(2))?;
            Reconciler::new(store, legacy, config.current_year).move_student(id, from, to)?;
            println!("moved");
        }
        "newstudent" => {
            let edits = parse_edits(&rest);
            let key = Reconciler::new(store, legacy, config.current_year)
                .create_record(&edits, RecordType::Student)?;
            println!("created student no {key}");
        }
        "save" => {
            legacy.save()?;
            println!("saved");
        }
        other => eprintln!("unknown command '{other}', try 'help'"),
    }
    Ok(())
}

fn parse_id(raw: Option<&&str>) -> GymResult<i64> {
    raw.and_then(|r| r.parse().ok())
        .ok_or_else(|| gymbook::GymError::validation("id", "expected a numeric id"))
}

fn parse_edits(parts: &[&str]) -> Vec<(String, String)> {
    parts
        .iter()
        .filter_map(|p| p.split_once('='))
        .map(|(k, v)| (k.to_string(), v.replace('_', " ")))
        .collect()
}
