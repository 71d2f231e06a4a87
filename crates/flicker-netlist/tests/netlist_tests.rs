//! Netlist generation tests for the built-in templates.

use std::path::Path;

use flicker_core::{extract, extract_with_overrides, Overrides};
use flicker_netlist::{templates, ModelSelector, Netlist, MODEL_SLOT, RESISTOR, TRANSISTOR};

fn resistor_netlist(selector: ModelSelector) -> Netlist {
    let params = extract(RESISTOR.defaults()).unwrap();
    Netlist::generate(&RESISTOR, &params, &selector.resolve(Path::new("models"))).unwrap()
}

#[test]
fn test_default_blocks_extract() {
    for template in templates::TEMPLATES {
        let params = extract(template.defaults()).unwrap();
        assert_eq!(params.value("freq").unwrap(), 131072.0);
        assert_eq!(params.value("ampl").unwrap(), 0.1);
        assert_eq!(params.quantity("freq").unwrap().units(), "Hz");
        assert_eq!(params.quantity("ampl").unwrap().units(), "V");
        assert_eq!(params.value("harms").unwrap(), 20.0);
    }
}

#[test]
fn test_slots_match_placeholders() {
    for template in templates::TEMPLATES {
        let placeholders = template.placeholders();
        for slot in template.slots() {
            assert!(
                placeholders.contains(slot),
                "{}: slot {} never used",
                template.name(),
                slot
            );
        }
        for placeholder in &placeholders {
            assert!(template.declares(placeholder));
        }
        assert!(template.declares(MODEL_SLOT));
    }
}

#[test]
fn test_resistor_netlist_values() {
    let netlist = resistor_netlist(ModelSelector::Nominal);
    let text = netlist.text();

    assert!(text.contains("ahdl_include \"models/resistor.va\""));
    assert!(text.contains("fund=131.072e3"));
    assert!(text.contains("ampl=100e-3"));
    assert!(text.contains("freq=131.072e3"));
    assert!(text.contains("stop=65.536e3"));
    assert!(text.contains("r=1e3"));
    assert!(text.contains("harms=20"));
    assert!(text.contains("pnoiseDC"));
    assert!(text.contains("pnoiseSin"));
    assert!(!text.contains("{{"));
}

#[test]
fn test_generation_is_deterministic() {
    let a = resistor_netlist(ModelSelector::Nominal);
    let b = resistor_netlist(ModelSelector::Nominal);
    assert_eq!(a.text(), b.text());
}

#[test]
fn test_broken_model_changes_only_model_line() {
    let nominal = resistor_netlist(ModelSelector::Nominal);
    let broken = resistor_netlist(ModelSelector::Broken);

    let differing: Vec<_> = nominal
        .text()
        .lines()
        .zip(broken.text().lines())
        .filter(|(a, b)| a != b)
        .collect();
    assert_eq!(
        differing,
        vec![(
            "ahdl_include \"models/resistor.va\"",
            "ahdl_include \"models/broken_resistor.va\""
        )]
    );
    assert_eq!(nominal.text().lines().count(), broken.text().lines().count());
}

#[test]
fn test_override_reaches_netlist() {
    let mut overrides = Overrides::new();
    overrides.insert("freq".to_string(), "1MHz".to_string());
    let params = extract_with_overrides(RESISTOR.defaults(), &overrides).unwrap();
    let netlist = Netlist::generate(&RESISTOR, &params, Path::new("resistor.va")).unwrap();

    assert!(netlist.text().contains("fund=1e6"));
    assert!(netlist.text().contains("stop=500e3"));
}

#[test]
fn test_transistor_netlist() {
    let params = extract(TRANSISTOR.defaults()).unwrap();
    let netlist = Netlist::generate(&TRANSISTOR, &params, Path::new("models/nmos.scs")).unwrap();
    let text = netlist.text();

    assert_eq!(netlist.template(), "transistor");
    assert!(text.contains("include \"models/nmos.scs\""));
    assert!(text.contains("w=1e-6 l=100e-9"));
    assert!(text.contains("dc=600e-3"));
    assert!(text.contains("dc=1.2"));
}

#[test]
fn test_missing_parameter_is_reported() {
    let params = extract("freq = 1kHz\n").unwrap();
    assert!(Netlist::generate(&RESISTOR, &params, Path::new("r.va")).is_err());
}

#[test]
fn test_write_overwrites() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("netlists").join("resistor.scs");
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, "stale content that is longer than nothing at all").unwrap();

    let netlist = resistor_netlist(ModelSelector::Nominal);
    netlist.write_to(&path).unwrap();
    assert_eq!(std::fs::read_to_string(&path).unwrap(), netlist.text());
}
