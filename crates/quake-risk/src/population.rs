use encoding_rs::Encoding;
use hazard_core::{round_to, DegeneratePolicy, HazardError, RegionSet, Result, ScoreVector};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

const POPULATION_LAYER: &str = "population";

/// A canonical village name that the published table may carry in a
/// mis-encoded form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameAlias {
    pub canonical: String,
    pub garbled: String,
}

/// Where the useful records sit in the population table. Blank lines are not
/// counted as records. Only the name and total columns are decoded, using
/// the WHATWG label in `encoding`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PopulationTableLayout {
    pub header_rows: usize,
    pub stride: usize,
    pub name_column: usize,
    pub total_column: usize,
    pub encoding: String,
    pub aliases: Vec<NameAlias>,
}

impl Default for PopulationTableLayout {
    fn default() -> Self {
        Self {
            header_rows: 4,
            stride: 3,
            name_column: 3,
            total_column: 5,
            encoding: "big5".into(),
            aliases: vec![NameAlias {
                canonical: "糖蔀里".into(),
                garbled: "糖?里".into(),
            }],
        }
    }
}

/// Total population per village name.
#[derive(Debug, Clone, Default)]
pub struct PopulationTable {
    totals: BTreeMap<String, u64>,
}

impl PopulationTable {
    pub fn read(path: &Path, layout: &PopulationTableLayout) -> Result<Self> {
        Self::parse(File::open(path)?, layout)
    }

    pub fn parse<R: Read>(reader: R, layout: &PopulationTableLayout) -> Result<Self> {
        if layout.stride == 0 {
            return Err(HazardError::schema(POPULATION_LAYER, "stride must be at least 1"));
        }
        let encoding = Encoding::for_label(layout.encoding.as_bytes()).ok_or_else(|| {
            HazardError::schema(
                POPULATION_LAYER,
                format!("unknown text encoding {:?}", layout.encoding),
            )
        })?;
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);

        let mut totals = BTreeMap::new();
        for (i, record) in reader.byte_records().enumerate() {
            let record = record?;
            if i < layout.header_rows || (i - layout.header_rows) % layout.stride != 0 {
                continue;
            }
            let field = |column: usize| {
                let raw = record.get(column).unwrap_or_default();
                let (text, had_errors) = encoding.decode_without_bom_handling(raw);
                if had_errors {
                    tracing::debug!(record = i, column, "undecodable bytes in population table");
                }
                text.trim().to_string()
            };
            let name = field(layout.name_column);
            if name.is_empty() {
                return Err(HazardError::schema(POPULATION_LAYER, format!("record {i} has no name")));
            }
            let raw_total = field(layout.total_column);
            let total = raw_total.replace(',', "").parse::<u64>().map_err(|e| {
                HazardError::schema(
                    POPULATION_LAYER,
                    format!("record {i} ({name}): bad total {raw_total:?}: {e}"),
                )
            })?;
            totals.insert(name, total);
        }

        for alias in &layout.aliases {
            if totals.contains_key(&alias.canonical) {
                continue;
            }
            if let Some(total) = totals.get(&alias.garbled).copied() {
                tracing::debug!(canonical = %alias.canonical, garbled = %alias.garbled, "population name fallback");
                totals.insert(alias.canonical.clone(), total);
            }
        }

        tracing::info!(villages = totals.len(), "loaded population table");
        Ok(Self { totals })
    }

    pub fn get(&self, name: &str) -> Result<u64> {
        self.totals
            .get(name)
            .copied()
            .ok_or_else(|| HazardError::MissingRegion(name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.totals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }
}

/// Population density per region (people per km²) and its `[0, 1]` index.
#[derive(Debug, Clone)]
pub struct PopulationDensityIndex {
    density: Option<ScoreVector>,
    index: ScoreVector,
}

impl PopulationDensityIndex {
    /// `density / max(density)`, densities rounded to 2 decimals first.
    pub fn from_table(
        regions: &RegionSet,
        table: &PopulationTable,
        policy: DegeneratePolicy,
    ) -> Result<Self> {
        let mut densities = Vec::with_capacity(regions.len());
        for region in regions {
            let population = table.get(region.name())? as f64;
            let km2 = region.area_m2() / 1e6;
            densities.push((region.name(), round_to(population / km2, 2)));
        }
        let density = ScoreVector::from_pairs(densities);

        let max = density.max().unwrap_or(0.0);
        let index = if max > 0.0 {
            ScoreVector::from_pairs(density.iter().map(|(name, d)| (name, d / max)))
        } else {
            let fill = match policy {
                DegeneratePolicy::Zero => 0.0,
                DegeneratePolicy::Half => 0.5,
                DegeneratePolicy::Fail => {
                    return Err(HazardError::DegenerateNormalization {
                        len: density.len(),
                        value: max,
                    })
                }
            };
            ScoreVector::from_pairs(density.iter().map(|(name, _)| (name, fill)))
        };

        Ok(Self {
            density: Some(density),
            index,
        })
    }

    /// An index supplied by another source; must cover every region.
    pub fn from_index(regions: &RegionSet, index: ScoreVector) -> Result<Self> {
        index.ensure_covers(regions)?;
        Ok(Self {
            density: None,
            index,
        })
    }

    pub fn index(&self, name: &str) -> Result<f64> {
        self.index.get(name)
    }

    pub fn density(&self, name: &str) -> Result<f64> {
        match &self.density {
            Some(density) => density.get(name),
            None => Err(HazardError::MissingRegion(name.to_string())),
        }
    }

    pub fn densities(&self) -> Option<&ScoreVector> {
        self.density.as_ref()
    }
}
