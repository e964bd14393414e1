//! Lists of model components shared between modules.
//!
//! Some constraints sum over components which are added by other modules, e.g. the load balance
//! sums every source of power production in a zone, and the objective sums every cost. Rather than
//! have the consuming module know about every contributor, each contributing module records the
//! name of its component here before the model is built. The consuming module then looks the
//! components up by name.
use crate::input::InputData;
use crate::optimisation::ComponentIndex;
use crate::project::{AvailabilityType, CapacityType, OperationalType, Project, ProjectID};
use crate::reserves::ReserveType;
use crate::temporal::{TemporalIndex, Timepoint};
use anyhow::{Context, Result};
use indexmap::{IndexMap, IndexSet};
use std::fmt;
use std::fs;
use std::path::Path;

/// Component names registered by modules for one model instance
#[derive(Debug, Default)]
pub struct DynamicComponents {
    /// Capacity types used by at least one project
    pub capacity_types: IndexSet<CapacityType>,
    /// Availability types used by at least one project
    pub availability_types: IndexSet<AvailabilityType>,
    /// Operational types used by at least one project
    pub operational_types: IndexSet<OperationalType>,
    /// The periods in which each project is operational
    pub operational_periods: IndexMap<ProjectID, Vec<u32>>,
    /// Names of variable families of upward reserves provided by each project
    pub headroom_variables: IndexMap<ProjectID, Vec<String>>,
    /// Names of variable families of downward reserves provided by each project
    pub footroom_variables: IndexMap<ProjectID, Vec<String>>,
    /// Expressions indexed by load zone and timepoint which supply power
    pub load_balance_production_components: Vec<String>,
    /// Expressions indexed by load zone and timepoint which consume power
    pub load_balance_consumption_components: Vec<String>,
    /// Expressions indexed by balancing area and timepoint which provide each reserve
    pub reserve_provision_components: IndexMap<ReserveType, Vec<String>>,
    /// Expressions indexed by carbon cap zone and period which count towards the cap
    pub carbon_cap_balance_emission_components: Vec<String>,
    /// Scalar expressions making up the objective function
    pub total_cost_components: Vec<String>,
}

impl DynamicComponents {
    /// Create the lists for a model instance, with the project types used by its portfolio
    pub fn new(inputs: &InputData) -> Self {
        let mut components = Self::default();
        for project in inputs.projects.values() {
            components.capacity_types.insert(project.capacity_type);
            components
                .availability_types
                .insert(project.availability_type);
            components
                .operational_types
                .insert(project.operational_type);
            components
                .headroom_variables
                .insert(project.id.clone(), Vec::new());
            components
                .footroom_variables
                .insert(project.id.clone(), Vec::new());
        }

        components
    }

    /// The periods in which a project is operational (empty if none have been recorded)
    pub fn operational_periods(&self, project: &ProjectID) -> &[u32] {
        self.operational_periods
            .get(project)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Whether a project is operational in a period
    pub fn is_operational(&self, project: &ProjectID, period: u32) -> bool {
        self.operational_periods(project).contains(&period)
    }

    /// Iterate over the timepoints in which a project is operational
    pub fn operational_timepoints<'a>(
        &'a self,
        project: &'a Project,
        temporal: &'a TemporalIndex,
    ) -> impl Iterator<Item = &'a Timepoint> + 'a {
        let periods = self.operational_periods(&project.id);
        temporal
            .iter_timepoints()
            .filter(move |tmp| periods.contains(&tmp.period))
    }

    /// Iterate over all operational (project, timepoint) pairs
    pub fn project_operational_timepoints<'a>(
        &'a self,
        inputs: &'a InputData,
    ) -> impl Iterator<Item = (&'a Project, &'a Timepoint)> + 'a {
        inputs.projects.values().flat_map(move |project| {
            self.operational_timepoints(project, &inputs.temporal)
                .map(move |tmp| (project, tmp))
        })
    }

    /// Iterate over all operational (project, period) pairs
    pub fn project_operational_periods<'a>(
        &'a self,
        inputs: &'a InputData,
    ) -> impl Iterator<Item = (&'a Project, u32)> + 'a {
        inputs.projects.values().flat_map(move |project| {
            self.operational_periods(&project.id)
                .iter()
                .map(move |period| (project, *period))
        })
    }

    /// Record the name of a variable family providing upward reserves for a project
    pub fn add_headroom_variable(&mut self, project: &ProjectID, name: String) {
        self.headroom_variables
            .entry(project.clone())
            .or_default()
            .push(name);
    }

    /// Record the name of a variable family providing downward reserves for a project
    pub fn add_footroom_variable(&mut self, project: &ProjectID, name: String) {
        self.footroom_variables
            .entry(project.clone())
            .or_default()
            .push(name);
    }

    /// Names of upward reserve variable families for a project
    pub fn headroom_variables(&self, project: &ProjectID) -> &[String] {
        self.headroom_variables
            .get(project)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Names of downward reserve variable families for a project
    pub fn footroom_variables(&self, project: &ProjectID) -> &[String] {
        self.footroom_variables
            .get(project)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

/// The name of the results table with one row per project and timepoint
pub const PROJECT_TIMEPOINT_TABLE: &str = "project_timepoint";

/// Index columns of [`PROJECT_TIMEPOINT_TABLE`]
pub const PROJECT_TIMEPOINT_INDEX: [&str; 2] = ["project", "timepoint"];

/// A value in a results table
#[derive(Clone, Debug, PartialEq)]
pub enum ResultValue {
    /// A numeric result
    Number(f64),
    /// A label, e.g. a load zone
    Text(String),
}

impl From<f64> for ResultValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for ResultValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for ResultValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl fmt::Display for ResultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(value) => write!(f, "{value}"),
            Self::Text(value) => write!(f, "{value}"),
        }
    }
}

/// A table of results to which several modules can contribute columns
#[derive(Debug, Default)]
pub struct ResultsTable {
    index_columns: Vec<&'static str>,
    columns: IndexSet<String>,
    rows: IndexMap<ComponentIndex, IndexMap<String, ResultValue>>,
}

impl ResultsTable {
    /// Set the value of a column in the row with the given index
    pub fn set<V: Into<ResultValue>>(&mut self, index: &ComponentIndex, column: &str, value: V) {
        assert_eq!(
            index.len(),
            self.index_columns.len(),
            "Index {index} does not match the columns of the table"
        );

        self.columns.insert(column.to_string());
        self.rows
            .entry(index.clone())
            .or_default()
            .insert(column.to_string(), value.into());
    }

    /// Get a value from the table
    pub fn get(&self, index: &ComponentIndex, column: &str) -> Option<&ResultValue> {
        self.rows.get(index)?.get(column)
    }

    /// The number of rows in the table
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Write the table to a CSV file. Missing values are left blank.
    pub fn write_csv(&self, file_path: &Path) -> Result<()> {
        let mut writer = csv::Writer::from_path(file_path)?;
        writer.write_record(
            self.index_columns
                .iter()
                .copied()
                .chain(self.columns.iter().map(String::as_str)),
        )?;

        for (index, values) in &self.rows {
            let record = index.iter().map(ToString::to_string).chain(
                self.columns.iter().map(|column| {
                    values
                        .get(column)
                        .map(ToString::to_string)
                        .unwrap_or_default()
                }),
            );
            writer.write_record(record)?;
        }
        writer.flush()?;

        Ok(())
    }
}

/// The results tables for a model instance, keyed by name
#[derive(Debug, Default)]
pub struct ResultsTables(IndexMap<String, ResultsTable>);

impl ResultsTables {
    /// Get a table, creating it if it does not exist yet.
    ///
    /// # Panics
    ///
    /// If the table already exists with different index columns.
    pub fn table(&mut self, name: &str, index_columns: &[&'static str]) -> &mut ResultsTable {
        let table = self
            .0
            .entry(name.to_string())
            .or_insert_with(|| ResultsTable {
                index_columns: index_columns.to_vec(),
                ..ResultsTable::default()
            });
        assert_eq!(
            table.index_columns, index_columns,
            "Results table {name} already has different index columns"
        );

        table
    }

    /// Look up an existing table
    pub fn get(&self, name: &str) -> Option<&ResultsTable> {
        self.0.get(name)
    }

    /// Iterate over the tables
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ResultsTable)> {
        self.0.iter().map(|(name, table)| (name.as_str(), table))
    }

    /// Write every non-empty table to `<name>.csv` in the given directory
    pub fn write_all(&self, results_dir: &Path) -> Result<()> {
        fs::create_dir_all(results_dir)?;
        for (name, table) in self.iter().filter(|(_, table)| !table.is_empty()) {
            let file_path = results_dir.join(format!("{name}.csv"));
            table
                .write_csv(&file_path)
                .with_context(|| format!("Failed to write {}", file_path.display()))?;
        }

        Ok(())
    }
}
