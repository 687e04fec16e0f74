use crate::domain::model::TransactionRecord;
use crate::domain::ports::TransactionSource;
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

/// DVF 匯出檔的欄位（其餘欄位忽略）
#[derive(Debug, Deserialize)]
struct DvfRow {
    id_mutation: String,
    date_mutation: Option<NaiveDate>,
    code_commune: String,
    valeur_fonciere: Option<f64>,
    id_parcelle: Option<String>,
    surface_terrain: Option<f64>,
    surface_reelle_bati: Option<f64>,
    type_local: Option<String>,
}

impl DvfRow {
    fn has_structure(&self) -> bool {
        self.type_local.as_deref().is_some_and(|t| !t.trim().is_empty())
            || self.surface_reelle_bati.is_some_and(|area| area > 0.0)
    }
}

/// 同一筆交易（`id_mutation`）的多列：售價每列重複，只計一次；
/// 土地面積按地號加總，同一地號的多列（多個建物）只計一次
#[derive(Debug)]
struct MutationRows {
    record: TransactionRecord,
    parcels: HashSet<String>,
}

impl MutationRows {
    fn start(row: DvfRow) -> Self {
        let mut rows = Self {
            record: TransactionRecord {
                mutation_id: row.id_mutation.clone(),
                date: row.date_mutation,
                commune_code: row.code_commune.clone(),
                price: row.valeur_fonciere,
                terrain_area_m2: None,
                built_area_m2: None,
                has_structure: false,
            },
            parcels: HashSet::new(),
        };
        rows.add(row);
        rows
    }

    fn add(&mut self, row: DvfRow) {
        let record = &mut self.record;
        record.has_structure |= row.has_structure();
        if record.price.is_none() {
            record.price = row.valeur_fonciere;
        }
        if record.date.is_none() {
            record.date = row.date_mutation;
        }
        if let Some(built) = row.surface_reelle_bati {
            record.built_area_m2 = Some(record.built_area_m2.unwrap_or(0.0) + built);
        }

        let first_seen = match &row.id_parcelle {
            Some(parcel) if !parcel.is_empty() => self.parcels.insert(parcel.clone()),
            _ => true,
        };
        if let (true, Some(terrain)) = (first_seen, row.surface_terrain) {
            record.terrain_area_m2 = Some(record.terrain_area_m2.unwrap_or(0.0) + terrain);
        }
    }
}

/// Transaction source backed by a DVF-style CSV export. The file is read on
/// every query; rows are grouped by mutation, then filtered by commune-code
/// prefix.
#[derive(Debug, Clone)]
pub struct CsvTransactionSource {
    path: PathBuf,
}

impl CsvTransactionSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn parse<R: std::io::Read>(reader: R, area_prefix: &str) -> Result<Vec<TransactionRecord>> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        // 依首次出現順序保留交易
        let mut mutations: Vec<MutationRows> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();
        for row in csv_reader.deserialize::<DvfRow>() {
            let row: DvfRow = row?;
            match index.get(&row.id_mutation) {
                Some(&position) => mutations[position].add(row),
                None => {
                    index.insert(row.id_mutation.clone(), mutations.len());
                    mutations.push(MutationRows::start(row));
                }
            }
        }

        Ok(mutations
            .into_iter()
            .map(|rows| rows.record)
            .filter(|record| record.commune_code.starts_with(area_prefix))
            .collect())
    }
}

#[async_trait]
impl TransactionSource for CsvTransactionSource {
    async fn transactions_by_prefix(&self, area_prefix: &str) -> Result<Vec<TransactionRecord>> {
        let path = self.path.clone();
        let prefix = area_prefix.to_string();

        // 檔案可能很大，放到 blocking 執行緒讀取
        let records = tokio::task::spawn_blocking(move || -> Result<Vec<TransactionRecord>> {
            let file = std::fs::File::open(&path)?;
            Self::parse(file, &prefix)
        })
        .await
        .map_err(|e| {
            crate::utils::error::FeasibilityError::collaborator(
                "transactions_csv",
                format!("CSV reader task failed: {}", e),
            )
        })??;

        tracing::debug!(
            "Read {} transactions with prefix {} from {}",
            records.len(),
            area_prefix,
            self.path.display()
        );
        Ok(records)
    }
}
