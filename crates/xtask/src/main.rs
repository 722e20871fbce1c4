use std::env;
use std::path::PathBuf;

use yijing_core::{Hexagram, HexagramTable, LoadPolicy, Relation};

fn main() {
    let args: Vec<String> = env::args().skip(1).collect();
    let task = args.first().map(|s| s.as_str()).unwrap_or("");

    match task {
        "check-table" => check_table(&args[1..]),
        "derive-grid" => derive_grid(),
        _ => {
            eprintln!("Usage: cargo run -p xtask -- check-table [--quarantine] [path]");
            eprintln!("       cargo run -p xtask -- derive-grid");
            std::process::exit(1);
        }
    }
}

/// Load a table file with the runtime loader rules and report what it found.
fn check_table(args: &[String]) {
    let quarantine = args.iter().any(|a| a == "--quarantine");
    let path = args
        .iter()
        .find(|a| !a.starts_with("--"))
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            workspace_root()
                .join("crates")
                .join("yijing-core")
                .join("data")
                .join("hexagrams.json")
        });
    let policy = if quarantine {
        LoadPolicy::Quarantine
    } else {
        LoadPolicy::Strict
    };

    println!("Checking {} ({policy:?})...", path.display());

    let table = match HexagramTable::load(&path, policy) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("FAILED: {e}");
            std::process::exit(1);
        }
    };

    let quarantined: Vec<_> = table.quarantined().collect();
    for h in &quarantined {
        println!("  quarantined: #{} {:?} ({})", h.number, h.raw_binary, h.english);
    }

    let mut incomplete = 0;
    for h in table.all() {
        let missing = missing_text(h);
        if !missing.is_empty() {
            incomplete += 1;
            println!("  #{} ({}) missing: {}", h.number, h.english, missing.join(", "));
        }
    }

    println!(
        "{} entries, {} quarantined, {} with missing text",
        table.len(),
        quarantined.len(),
        incomplete
    );

    if !quarantined.is_empty() {
        std::process::exit(2);
    }
}

/// Display fields a row lacks. Derivation never reads these.
fn missing_text(h: &Hexagram) -> Vec<&'static str> {
    let mut missing = Vec::new();
    if h.judgment.text.is_empty() {
        missing.push("judgment");
    }
    if h.image.text.is_empty() {
        missing.push("image");
    }
    if h.symbolic.is_empty() {
        missing.push("symbolic");
    }
    if h.line_texts.len() != 6 {
        missing.push("line texts");
    }
    missing
}

/// Print every hexagram's relatives for user number 0 as a quick visual check
/// of the embedded table.
fn derive_grid() {
    let table = HexagramTable::embedded().unwrap_or_else(|e| {
        eprintln!("embedded table failed to load: {e}");
        std::process::exit(1);
    });

    print!("{:>3} {:<7}", "#", "lines");
    for r in Relation::ALL {
        print!(" {:>9}", r.label());
    }
    println!();

    for h in table.all() {
        let related = table.calculate_all_related(h, 0);
        print!("{:>3} {:<7}", h.number, h.binary_key().unwrap_or_default());
        for (_, found) in related.related() {
            let cell = found.map(|f| f.number.to_string()).unwrap_or_else(|| "-".into());
            print!(" {cell:>9}");
        }
        println!();
    }
}

fn workspace_root() -> PathBuf {
    // Walk up from current dir to find Cargo.toml with [workspace]
    let mut dir = env::current_dir().expect("no current dir");
    loop {
        let manifest = dir.join("Cargo.toml");
        if let Ok(contents) = std::fs::read_to_string(&manifest) {
            if contents.contains("[workspace]") {
                return dir;
            }
        }
        if !dir.pop() {
            panic!("could not find workspace root");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_rows_are_complete() {
        let table = HexagramTable::embedded().unwrap();
        assert!(table.all().iter().all(|h| missing_text(h).is_empty()));
    }

    #[test]
    fn reports_each_missing_field() {
        let table = HexagramTable::embedded().unwrap();
        let mut h = table.all()[0].clone();
        h.image = Default::default();
        h.line_texts.truncate(3);
        assert_eq!(missing_text(&h), vec!["image", "line texts"]);
    }
}
