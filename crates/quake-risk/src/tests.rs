use crate::{
    risk_collection, round_to, write_risk_table, PopulationDensityIndex, PopulationTable,
    PopulationTableLayout, RiskBand, RiskIndexCalculator, VulnerabilityAggregator,
    VulnerabilityCache, VulnerabilityIndex, SCENARIOS, VULNERABILITY_PROPERTY,
};
use geo::{LineString, MultiPolygon, Polygon};
use hazard_core::geojson::FeatureCollection;
use hazard_core::{DegeneratePolicy, HazardError, Region, RegionSet, ScoreVector};
use hazard_scorers::LayerScores;
use proptest::prelude::*;
use serde_json::json;
use std::cell::Cell;
use std::path::PathBuf;

fn square(name: &str, x0: f64, side: f64, area_m2: f64) -> Region {
    let ring = LineString::from(vec![
        (x0, 0.0),
        (x0 + side, 0.0),
        (x0 + side, side),
        (x0, side),
        (x0, 0.0),
    ]);
    let raw = json!({
        "type": "Polygon",
        "coordinates": [[[x0, 0.0], [x0 + side, 0.0], [x0 + side, side], [x0, side], [x0, 0.0]]],
    });
    Region::new(name, MultiPolygon::new(vec![Polygon::new(ring, vec![])]), area_m2, raw).unwrap()
}

/// Three villages of 1, 2 and 4 km².
fn villages() -> RegionSet {
    RegionSet::new(vec![
        square("a", 0.0, 1.0, 1e6),
        square("b", 1.0, 1.0, 2e6),
        square("c", 2.0, 1.0, 4e6),
    ])
    .unwrap()
}

fn layers(slope: [f64; 3], building: [f64; 3], liquefaction: [f64; 3]) -> LayerScores {
    let vector = |v: [f64; 3]| ScoreVector::from_pairs([("a", v[0]), ("b", v[1]), ("c", v[2])]);
    LayerScores {
        slope: vector(slope),
        building: vector(building),
        liquefaction: vector(liquefaction),
        unmatched_points: 0,
    }
}

fn scratch(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("quake-risk-{}-{name}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn population_text(rows: &[(&str, &str)]) -> String {
    let mut text = String::from("title\nunits\ncol-a,col-b\n,,,,,\n");
    for (name, total) in rows {
        text.push_str(&format!("x,y,z,{name},m,\"{total}\"\n"));
        text.push_str("male,,,,,1\n");
        text.push_str("female,,,,,1\n");
    }
    text
}

#[test]
fn combine_takes_the_mean_and_normalizes_again() {
    let regions = villages();
    let aggregator = VulnerabilityAggregator::new(DegeneratePolicy::Zero);
    let index = aggregator
        .combine(&regions, &layers([1.0, 0.0, 0.5], [0.0, 0.0, 1.0], [1.0, 0.0, 0.0]))
        .unwrap();

    assert_eq!(index.get("a").unwrap(), 1.0);
    assert_eq!(index.get("b").unwrap(), 0.0);
    assert!((index.get("c").unwrap() - 0.75).abs() < 1e-12);
}

#[test]
fn combine_reports_a_region_missing_from_a_layer() {
    let regions = villages();
    let mut scores = layers([1.0, 0.0, 0.5], [0.0, 0.0, 1.0], [1.0, 0.0, 0.0]);
    scores.building = ScoreVector::from_pairs([("a", 1.0), ("b", 0.0)]);
    let err = VulnerabilityAggregator::new(DegeneratePolicy::Zero)
        .combine(&regions, &scores)
        .unwrap_err();
    assert!(matches!(err, HazardError::MissingRegion(name) if name == "c"));
}

#[test]
fn persisted_index_short_circuits_scoring() {
    let regions = villages();
    let dir = scratch("cache");
    let cache = VulnerabilityCache::new(dir.join("vulnerability.geojson"), "VNAME");
    let aggregator = VulnerabilityAggregator::new(DegeneratePolicy::Zero).with_cache(cache.clone());

    let first = aggregator
        .resolve(&regions, || Ok(layers([1.0, 0.0, 0.5], [0.0, 0.0, 1.0], [1.0, 0.0, 0.0])))
        .unwrap();
    assert!(!first.is_cached());
    assert!(cache.exists());

    let called = Cell::new(false);
    let second = aggregator
        .resolve(&regions, || {
            called.set(true);
            Err(HazardError::schema("slopes", "unknown level"))
        })
        .unwrap();

    assert!(!called.get());
    assert!(second.is_cached());
    for name in regions.names() {
        let persisted = second.index().get(name).unwrap();
        assert!((persisted - first.index().get(name).unwrap()).abs() < 1e-12);
    }
}

#[test]
fn persisted_artifact_keeps_geometry_and_names() {
    let regions = villages();
    let dir = scratch("artifact");
    let cache = VulnerabilityCache::new(dir.join("v.geojson"), "VNAME");
    let index = VulnerabilityIndex::new(ScoreVector::from_pairs([("a", 0.2), ("b", 1.0), ("c", 0.0)]));
    cache.store(&regions, &index).unwrap();

    let written = FeatureCollection::read(cache.path()).unwrap();
    assert_eq!(written.features.len(), 3);
    let first = &written.features[0];
    assert_eq!(first.property("VNAME"), Some(&json!("a")));
    assert_eq!(first.property(VULNERABILITY_PROPERTY), Some(&json!(0.2)));
    assert_eq!(first.geometry.as_ref(), Some(regions.get("a").unwrap().raw_geometry()));
}

#[test]
fn cache_missing_a_region_is_rejected() {
    let regions = villages();
    let dir = scratch("partial");
    let path = dir.join("v.geojson");
    let partial = RegionSet::new(vec![square("a", 0.0, 1.0, 1e6)]).unwrap();
    let index = VulnerabilityIndex::new(ScoreVector::from_pairs([("a", 0.5)]));
    VulnerabilityCache::new(&path, "VNAME").store(&partial, &index).unwrap();

    let err = VulnerabilityCache::new(&path, "VNAME").load(&regions).unwrap_err();
    assert!(matches!(err, HazardError::MissingRegion(_)));
}

#[test]
fn population_table_reads_every_third_record_after_the_header() {
    let text = population_text(&[("a", "1,000"), ("b", "3000"), ("c", "500")]);
    let table = PopulationTable::parse(text.as_bytes(), &PopulationTableLayout::default()).unwrap();

    assert_eq!(table.len(), 3);
    assert_eq!(table.get("a").unwrap(), 1000);
    assert_eq!(table.get("b").unwrap(), 3000);
    assert!(matches!(table.get("male"), Err(HazardError::MissingRegion(_))));
}

fn big5(text: &str) -> Vec<u8> {
    let (bytes, _, unmappable) = encoding_rs::BIG5.encode(text);
    assert!(!unmappable, "{text:?} is not representable in Big5");
    bytes.into_owned()
}

#[test]
fn garbled_name_falls_back_to_its_canonical_form() {
    let bytes = big5(&population_text(&[("糖?里", "4200")]));
    let table = PopulationTable::parse(bytes.as_slice(), &PopulationTableLayout::default()).unwrap();
    assert_eq!(table.get("糖蔀里").unwrap(), 4200);
}

#[test]
fn big5_table_decodes_names_and_tolerates_bad_bytes_elsewhere() {
    let mut bytes = big5("臺北市村里人口統計\n單位:人\n區別,村里,鄰數,戶數\n,,,,,\n");
    bytes.extend(big5("總計,松山區,,大安里,男女,\"12,345\"\n,,,,,1\n,,,,,1\n"));
    // lone lead byte in a column that is never decoded
    bytes.extend_from_slice(b"\xfa,,,");
    bytes.extend(big5("民生里,男女,678\n,,,,,1\n,,,,,1\n"));

    let table = PopulationTable::parse(bytes.as_slice(), &PopulationTableLayout::default()).unwrap();
    assert_eq!(table.len(), 2);
    assert_eq!(table.get("大安里").unwrap(), 12_345);
    assert_eq!(table.get("民生里").unwrap(), 678);
}

#[test]
fn unknown_table_encoding_is_a_schema_error() {
    let layout = PopulationTableLayout {
        encoding: "klingon".into(),
        ..PopulationTableLayout::default()
    };
    let err = PopulationTable::parse(&b""[..], &layout).unwrap_err();
    assert!(matches!(err, HazardError::InputSchema { .. }));
}

#[test]
fn malformed_population_total_is_a_schema_error() {
    let text = population_text(&[("a", "many")]);
    let err = PopulationTable::parse(text.as_bytes(), &PopulationTableLayout::default()).unwrap_err();
    assert!(matches!(err, HazardError::InputSchema { .. }));
}

#[test]
fn density_index_divides_by_the_densest_village() {
    let regions = villages();
    let text = population_text(&[("a", "1000"), ("b", "1000"), ("c", "1000")]);
    let table = PopulationTable::parse(text.as_bytes(), &PopulationTableLayout::default()).unwrap();
    let density = PopulationDensityIndex::from_table(&regions, &table, DegeneratePolicy::Zero).unwrap();

    assert_eq!(density.density("a").unwrap(), 1000.0);
    assert_eq!(density.density("c").unwrap(), 250.0);
    assert_eq!(density.index("a").unwrap(), 1.0);
    assert_eq!(density.index("b").unwrap(), 0.5);
    assert_eq!(density.index("c").unwrap(), 0.25);
}

#[test]
fn village_without_population_is_missing() {
    let regions = villages();
    let text = population_text(&[("a", "1000"), ("b", "1000")]);
    let table = PopulationTable::parse(text.as_bytes(), &PopulationTableLayout::default()).unwrap();
    let err = PopulationDensityIndex::from_table(&regions, &table, DegeneratePolicy::Zero).unwrap_err();
    assert!(matches!(err, HazardError::MissingRegion(name) if name == "c"));
}

#[test]
fn empty_villages_follow_the_degenerate_policy() {
    let regions = villages();
    let text = population_text(&[("a", "0"), ("b", "0"), ("c", "0")]);
    let table = PopulationTable::parse(text.as_bytes(), &PopulationTableLayout::default()).unwrap();

    let half = PopulationDensityIndex::from_table(&regions, &table, DegeneratePolicy::Half).unwrap();
    assert_eq!(half.index("b").unwrap(), 0.5);
    assert!(matches!(
        PopulationDensityIndex::from_table(&regions, &table, DegeneratePolicy::Fail),
        Err(HazardError::DegenerateNormalization { len: 3, .. })
    ));
}

#[test]
fn risk_is_the_mean_of_density_vulnerability_and_intensity() {
    let regions = villages();
    let vulnerability =
        VulnerabilityIndex::new(ScoreVector::from_pairs([("a", 0.6), ("b", 0.0), ("c", 1.0)]));
    let density = PopulationDensityIndex::from_index(
        &regions,
        ScoreVector::from_pairs([("a", 0.3), ("b", 0.0), ("c", 1.0)]),
    )
    .unwrap();

    let matrix = RiskIndexCalculator.compute(&regions, &vulnerability, &density).unwrap();
    let a = matrix.row("a").unwrap();
    assert!((a.values[0] - 0.3).abs() < 1e-12);
    assert!((a.values[5] - (0.9 + 5.0 / 6.0) / 3.0).abs() < 1e-12);
    assert_eq!(matrix.row("b").unwrap().values[0], 0.0);
    assert_eq!(matrix.row("c").unwrap().region, "c");
    assert!(matches!(matrix.row("z"), Err(HazardError::MissingRegion(_))));

    let bands = matrix.band_summary();
    assert_eq!(bands.len(), SCENARIOS.len());
    // 4級: a 0.3 medium, b 0.0 low, c 0.66667 high
    assert_eq!((bands[0].low, bands[0].medium, bands[0].high), (1, 1, 1));
    // 7級: a 0.57778 high, b 0.27778 medium, c 0.94444 high
    assert_eq!((bands[5].low, bands[5].medium, bands[5].high), (0, 1, 2));
}

#[test]
fn risk_outputs_are_rounded_to_five_places() {
    let regions = villages();
    let vulnerability =
        VulnerabilityIndex::new(ScoreVector::from_pairs([("a", 0.1), ("b", 0.2), ("c", 0.3)]));
    let density = PopulationDensityIndex::from_index(
        &regions,
        ScoreVector::from_pairs([("a", 0.0), ("b", 0.0), ("c", 0.0)]),
    )
    .unwrap();
    let matrix = RiskIndexCalculator.compute(&regions, &vulnerability, &density).unwrap();

    let mut table = Vec::new();
    write_risk_table(&mut table, &matrix).unwrap();
    let table = String::from_utf8(table).unwrap();
    let mut lines = table.lines();
    assert_eq!(
        lines.next(),
        Some("vname,intensity_4級,intensity_5弱,intensity_5強,intensity_6弱,intensity_6強,intensity_7級")
    );
    assert!(lines.next().unwrap().starts_with("a,0.03333,0.08889,"));

    let collection = risk_collection(&regions, "VNAME", &matrix).unwrap();
    assert_eq!(collection.features[0].property("5弱"), Some(&json!(0.08889)));
}

#[test]
fn bands_split_at_quarter_and_half() {
    assert_eq!(RiskBand::classify(0.0), RiskBand::Low);
    assert_eq!(RiskBand::classify(0.24999), RiskBand::Low);
    assert_eq!(RiskBand::classify(0.25), RiskBand::Medium);
    assert_eq!(RiskBand::classify(0.5), RiskBand::High);
}

#[test]
fn round_to_handles_halves_and_places() {
    assert_eq!(round_to(1234.567, 2), 1234.57);
    assert_eq!(round_to(0.123456, 5), 0.12346);
    assert_eq!(round_to(2.0 / 3.0, 0), 1.0);
}

proptest! {
    #[test]
    fn risk_never_decreases_with_intensity(v in 0.0f64..=1.0, d in 0.0f64..=1.0) {
        let regions = RegionSet::new(vec![square("only", 0.0, 1.0, 1e6)]).unwrap();
        let vulnerability = VulnerabilityIndex::new(ScoreVector::from_pairs([("only", v)]));
        let density = PopulationDensityIndex::from_index(
            &regions,
            ScoreVector::from_pairs([("only", d)]),
        ).unwrap();

        let matrix = RiskIndexCalculator.compute(&regions, &vulnerability, &density).unwrap();
        let row = matrix.row("only").unwrap();
        for pair in row.values.windows(2) {
            prop_assert!(pair[0] <= pair[1]);
        }
        prop_assert!(row.values.iter().all(|r| (0.0..=1.0).contains(r)));
    }
}
