//! Weapon table ingestion from CSV: header mapping, numeric coercion, validity warnings.

use super::{ArmorTier, WeaponRecord, Zone};
use crate::config::{MAX_CSV_BYTES, MAX_RECORDS};
use crate::error::{BalanceError, BalanceResult};
use crate::util::{coerce_number, normalize_name};
use std::collections::{BTreeSet, HashMap};
use std::io::Read;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, warn};

/// Records in file order plus the non-fatal problems seen while reading them.
#[derive(Debug, Clone, Default)]
pub struct LoadedDataset {
    pub records: Vec<WeaponRecord>,
    pub warnings: Vec<String>,
}

/// Which table a `<Zone> TTK <Tier>` / `<Zone> STK <Tier>` header feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoneColumn {
    Ttk(Zone, ArmorTier),
    Stk(Zone, ArmorTier),
}

/// Parse a zone column header such as `Body TTK M`. `Overall` is not a source column.
pub fn parse_zone_column(header: &str) -> Option<ZoneColumn> {
    let mut parts = header.split_whitespace();
    let zone = Zone::from_str(parts.next()?).ok()?;
    let kind = parts.next()?;
    let tier = ArmorTier::from_str(parts.next()?).ok()?;
    if parts.next().is_some() || zone == Zone::Overall {
        return None;
    }
    match kind {
        "TTK" => Some(ZoneColumn::Ttk(zone, tier)),
        "STK" => Some(ZoneColumn::Stk(zone, tier)),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy)]
enum NumberField {
    Damage,
    Mag,
    Reload,
    Range,
    Stability,
    Agility,
    Stealth,
    Weight,
    Sell,
    CritMulti,
    ListedDps,
}

#[derive(Debug, Clone, Copy)]
enum TextField {
    FiringMode,
    ArmorPen,
    Rarity,
    Notes,
}

#[derive(Debug, Clone, Copy)]
enum Column {
    Name,
    Category,
    Number(NumberField),
    Text(TextField),
    Zone(ZoneColumn),
}

fn column_for(header: &str) -> Option<Column> {
    let col = match header {
        "Name" => Column::Name,
        "Category" => Column::Category,
        "DMG" => Column::Number(NumberField::Damage),
        "Mag" => Column::Number(NumberField::Mag),
        "Reload" => Column::Number(NumberField::Reload),
        "Range" => Column::Number(NumberField::Range),
        "Stability" => Column::Number(NumberField::Stability),
        "Agility" => Column::Number(NumberField::Agility),
        "Stealth" => Column::Number(NumberField::Stealth),
        "Weight" => Column::Number(NumberField::Weight),
        "Sell" => Column::Number(NumberField::Sell),
        "Crit Multi" => Column::Number(NumberField::CritMulti),
        "DPS" => Column::Number(NumberField::ListedDps),
        "Firing Mode" => Column::Text(TextField::FiringMode),
        "Armor Pen" => Column::Text(TextField::ArmorPen),
        "R" | "Rarity" => Column::Text(TextField::Rarity),
        "Notes" => Column::Text(TextField::Notes),
        other => Column::Zone(parse_zone_column(other)?),
    };
    Some(col)
}

fn number_slot(r: &mut WeaponRecord, f: NumberField) -> &mut Option<f64> {
    match f {
        NumberField::Damage => &mut r.damage,
        NumberField::Mag => &mut r.mag,
        NumberField::Reload => &mut r.reload,
        NumberField::Range => &mut r.range,
        NumberField::Stability => &mut r.stability,
        NumberField::Agility => &mut r.agility,
        NumberField::Stealth => &mut r.stealth,
        NumberField::Weight => &mut r.weight,
        NumberField::Sell => &mut r.sell,
        NumberField::CritMulti => &mut r.crit_multi,
        NumberField::ListedDps => &mut r.listed_dps,
    }
}

fn text_slot(r: &mut WeaponRecord, f: TextField) -> &mut Option<String> {
    match f {
        TextField::FiringMode => &mut r.firing_mode,
        TextField::ArmorPen => &mut r.armor_pen_label,
        TextField::Rarity => &mut r.rarity,
        TextField::Notes => &mut r.notes,
    }
}

/// Read a weapon table from a CSV file, bounded by [`MAX_CSV_BYTES`].
pub fn load_weapons_csv(path: &Path) -> BalanceResult<LoadedDataset> {
    let size = std::fs::metadata(path)?.len();
    if size > MAX_CSV_BYTES as u64 {
        return Err(BalanceError::Validation(format!(
            "file too large: {} bytes (max {})",
            size, MAX_CSV_BYTES
        )));
    }
    let file = std::fs::File::open(path)?;
    let dataset = load_weapons_from_reader(file)?;
    debug!(
        "loaded {} weapon(s) from {}",
        dataset.records.len(),
        path.display()
    );
    Ok(dataset)
}

/// Read a weapon table from any CSV source with a header row.
pub fn load_weapons_from_reader<R: Read>(reader: R) -> BalanceResult<LoadedDataset> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let columns: Vec<Option<Column>> = headers.iter().map(column_for).collect();
    if !headers.iter().any(|h| h == "Name") {
        return Err(BalanceError::Validation(
            "weapon table has no Name column".to_string(),
        ));
    }

    let mut out = LoadedDataset::default();
    if !columns.iter().any(|c| matches!(c, Some(Column::Zone(_)))) {
        out.warnings
            .push("no '<Zone> TTK <Tier>' or '<Zone> STK <Tier>' columns found".to_string());
    }

    let mut seen = HashMap::<String, usize>::new();
    let mut skipped = 0usize;
    for (line, row) in rdr.records().enumerate() {
        let row = row?;
        if out.records.len() >= MAX_RECORDS {
            return Err(BalanceError::Validation(format!(
                "too many rows (max {})",
                MAX_RECORDS
            )));
        }
        let mut record = WeaponRecord::default();
        for (col, cell) in columns.iter().zip(row.iter()) {
            let Some(col) = col else { continue };
            match col {
                Column::Name => record.name = cell.to_string(),
                Column::Category => record.category = cell.to_string(),
                Column::Number(f) => *number_slot(&mut record, *f) = coerce_number(cell),
                Column::Text(f) => {
                    *text_slot(&mut record, *f) = (!cell.is_empty()).then(|| cell.to_string())
                }
                Column::Zone(ZoneColumn::Ttk(z, t)) => record.ttk.set(*z, *t, coerce_number(cell)),
                Column::Zone(ZoneColumn::Stk(z, t)) => record.stk.set(*z, *t, coerce_number(cell)),
            }
        }
        if record.name.is_empty() || record.name == "Name" {
            skipped += 1;
            continue;
        }
        if record.category.is_empty() {
            record.category = "Unknown".to_string();
        }
        if let Some(first) = seen.insert(normalize_name(&record.name), line + 2) {
            out.warnings.push(format!(
                "duplicate weapon name {:?} on line {} (first seen on line {})",
                record.name,
                line + 2,
                first
            ));
        }
        if record.ttk.is_empty() {
            out.warnings
                .push(format!("weapon {:?} has no TTK values", record.name));
        }
        out.records.push(record);
    }
    if skipped > 0 {
        out.warnings
            .push(format!("skipped {} row(s) without a weapon name", skipped));
    }

    let categories: BTreeSet<&str> = out.records.iter().map(|r| r.category.as_str()).collect();
    debug!(
        "{} record(s) across {} categor(ies)",
        out.records.len(),
        categories.len()
    );
    for w in &out.warnings {
        warn!("{}", w);
    }
    Ok(out)
}
