use chrono::{DateTime, Utc};
use plantledger_core::{
    error::LedgerError,
    period::Period,
    store::{completed_between, LedgerStore},
};
use plantledger_schemas::{
    equipment::Equipment,
    expense::MonthlyExpense,
    file_formats::{
        EquipmentFile, ExpenseFile, PlanFile, ProductionOrderFile, TechnologyCardFile,
        SCHEMA_VERSION,
    },
    plan::StrategicPlan,
    production_order::ProductionOrder,
    technology_card::TechnologyCard,
};
use serde::{de::DeserializeOwned, Serialize};
use std::{
    collections::{BTreeMap, HashMap},
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, info};

const EXPENSES_FILE: &str = "expenses.yaml";

/// A `LedgerStore` over a directory of YAML files:
///
/// ```text
/// data/
///   equipment/*.yaml
///   technology_cards/*.yaml
///   production_orders/*.yaml
///   plans/*.yaml
///   expenses.yaml
/// ```
///
/// Every fetch re-reads the files, so edits made between calls are seen.
pub struct YamlStore {
    root: PathBuf,
}

impl YamlStore {
    pub fn open(root: &Path) -> Result<Self, LedgerError> {
        if !root.is_dir() {
            return Err(LedgerError::ConfigError(format!(
                "data directory {:?} does not exist",
                root
            )));
        }
        info!(root = %root.display(), "opened data directory");
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    pub fn plans(&self) -> Result<BTreeMap<String, StrategicPlan>, LedgerError> {
        load_yaml_files_into_map(
            self.root.join("plans"),
            |file: PlanFile| file.plans,
            |item: &StrategicPlan| item.plan_id.clone(),
        )
    }

    fn equipment(&self) -> Result<BTreeMap<String, Equipment>, LedgerError> {
        load_yaml_files_into_map(
            self.root.join("equipment"),
            |file: EquipmentFile| file.equipment,
            |item: &Equipment| item.equipment_id.clone(),
        )
    }

    fn production_orders(&self) -> Result<BTreeMap<String, ProductionOrder>, LedgerError> {
        load_yaml_files_into_map(
            self.root.join("production_orders"),
            |file: ProductionOrderFile| file.production_orders,
            |item: &ProductionOrder| item.order_id.clone(),
        )
    }

    fn expenses_path(&self) -> PathBuf {
        self.root.join(EXPENSES_FILE)
    }

    fn read_expenses(&self) -> Result<ExpenseFile, LedgerError> {
        let path = self.expenses_path();
        if !path.exists() {
            return Ok(ExpenseFile::default());
        }
        read_yaml(&path)
    }

    /// Writes `plan` back into the file that defines it, or into
    /// `plans/<plan_id>.yaml` for a plan not yet on disk.
    pub fn save_plan(&self, plan: &StrategicPlan) -> Result<PathBuf, LedgerError> {
        let dir = self.root.join("plans");
        fs::create_dir_all(&dir).map_err(|e| LedgerError::FileIO(dir.display().to_string(), e))?;

        // Later files win on load, so search from the back.
        let mut target = None;
        for path in yaml_paths(&dir)?.into_iter().rev() {
            let file: PlanFile = read_yaml(&path)?;
            if file.plans.iter().any(|p| p.plan_id == plan.plan_id) {
                target = Some((path, file));
                break;
            }
        }
        let (path, mut file) = target.unwrap_or_else(|| {
            (
                dir.join(format!("{}.yaml", plan.plan_id)),
                PlanFile {
                    schema_version: SCHEMA_VERSION.to_string(),
                    plans: Vec::new(),
                },
            )
        });
        match file.plans.iter_mut().find(|p| p.plan_id == plan.plan_id) {
            Some(existing) => *existing = plan.clone(),
            None => file.plans.push(plan.clone()),
        }
        write_yaml(&path, &file)?;
        debug!(plan = %plan.plan_id, path = %path.display(), "saved plan");
        Ok(path)
    }
}

impl LedgerStore for YamlStore {
    fn fetch_monthly_expense(&self, period: Period) -> Result<Option<MonthlyExpense>, LedgerError> {
        let key = period.key();
        Ok(self
            .read_expenses()?
            .monthly_expenses
            .into_iter()
            .find(|r| r.id == key))
    }

    fn fetch_monthly_expenses(&self) -> Result<Vec<MonthlyExpense>, LedgerError> {
        let mut records = self.read_expenses()?.monthly_expenses;
        records.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(records)
    }

    fn fetch_active_equipment(&self) -> Result<Vec<Equipment>, LedgerError> {
        Ok(self
            .equipment()?
            .into_values()
            .filter(Equipment::is_active)
            .collect())
    }

    fn fetch_completed_production_orders(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<ProductionOrder>, LedgerError> {
        let orders: Vec<ProductionOrder> = self.production_orders()?.into_values().collect();
        Ok(completed_between(&orders, start, end))
    }

    /// Cards in file-name and in-file order, so the first card listed for an
    /// item is the one the rollup uses.
    fn fetch_technology_cards(&self) -> Result<Vec<TechnologyCard>, LedgerError> {
        load_yaml_files_in_order(
            self.root.join("technology_cards"),
            |file: TechnologyCardFile| file.technology_cards,
            |item: &TechnologyCard| item.card_id.clone(),
        )
    }

    fn save_monthly_expense(&mut self, record: MonthlyExpense) -> Result<MonthlyExpense, LedgerError> {
        let mut file = self.read_expenses()?;
        file.schema_version = SCHEMA_VERSION.to_string();
        match file.monthly_expenses.iter_mut().find(|r| r.id == record.id) {
            Some(existing) => *existing = record.clone(),
            None => file.monthly_expenses.push(record.clone()),
        }
        file.monthly_expenses.sort_by(|a, b| a.id.cmp(&b.id));
        write_yaml(&self.expenses_path(), &file)?;
        debug!(key = %record.id, path = %self.expenses_path().display(), "upserted monthly expense");
        Ok(record)
    }
}

/// Loads every YAML file in a directory into a map keyed by `get_key`.
/// Files are read in name order, so a later file overrides an earlier one.
/// A missing directory yields an empty map.
fn load_yaml_files_into_map<P, F, E, T, K>(
    dir_path: P,
    extract_vec: E,
    get_key: K,
) -> Result<BTreeMap<String, T>, LedgerError>
where
    P: AsRef<Path>,
    F: DeserializeOwned, // The file wrapper struct (e.g., EquipmentFile)
    E: Fn(F) -> Vec<T>,  // A closure to extract the Vec<T> from the wrapper
    K: Fn(&T) -> String, // A closure to get the key for the map from an item T
{
    let mut map = BTreeMap::new();
    for path in yaml_paths(dir_path.as_ref())? {
        let file_wrapper: F = read_yaml(&path)?;
        for item in extract_vec(file_wrapper) {
            map.insert(get_key(&item), item);
        }
    }
    Ok(map)
}

/// Like `load_yaml_files_into_map`, but keeps the order items first appear
/// in. A repeated key replaces the earlier item where it stands.
fn load_yaml_files_in_order<P, F, E, T, K>(
    dir_path: P,
    extract_vec: E,
    get_key: K,
) -> Result<Vec<T>, LedgerError>
where
    P: AsRef<Path>,
    F: DeserializeOwned,
    E: Fn(F) -> Vec<T>,
    K: Fn(&T) -> String,
{
    let mut items: Vec<T> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();
    for path in yaml_paths(dir_path.as_ref())? {
        let file_wrapper: F = read_yaml(&path)?;
        for item in extract_vec(file_wrapper) {
            let key = get_key(&item);
            match positions.get(&key).copied() {
                Some(index) => items[index] = item,
                None => {
                    positions.insert(key, items.len());
                    items.push(item);
                }
            }
        }
    }
    Ok(items)
}

/// The `*.yaml` and `*.yml` files directly inside `dir`, sorted by name.
fn yaml_paths(dir: &Path) -> Result<Vec<PathBuf>, LedgerError> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let label = dir.display().to_string();
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| LedgerError::FileIO(label.clone(), e))? {
        let path = entry.map_err(|e| LedgerError::FileIO(label.clone(), e))?.path();
        if path.is_file() && path.extension().map_or(false, |s| s == "yaml" || s == "yml") {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

fn read_yaml<T: DeserializeOwned>(path: &Path) -> Result<T, LedgerError> {
    let label = path.display().to_string();
    let content = fs::read_to_string(path).map_err(|e| LedgerError::FileIO(label.clone(), e))?;
    serde_yaml::from_str(&content).map_err(|e| LedgerError::YamlParsing(label, e))
}

/// Writes through a sibling temp file; the previous contents stay intact
/// until the rename.
fn write_yaml<T: Serialize>(path: &Path, value: &T) -> Result<(), LedgerError> {
    let label = path.display().to_string();
    let content =
        serde_yaml::to_string(value).map_err(|e| LedgerError::YamlWriting(label.clone(), e))?;
    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp = PathBuf::from(tmp_name);
    fs::write(&tmp, content).map_err(|e| LedgerError::FileIO(tmp.display().to_string(), e))?;
    fs::rename(&tmp, path).map_err(|e| LedgerError::FileIO(label, e))
}
