use flicker_netlist::ModelSelector;

use super::CurveSpec;

pub(super) const CURVES: &[CurveSpec] = &[
    CurveSpec {
        analysis: "pnoiseDC",
        kind: "pnoise",
        signal: "out",
        label: "DC drive",
        amplitude: true,
    },
    CurveSpec {
        analysis: "pnoiseSin",
        kind: "pnoise",
        signal: "out",
        label: "sinusoidal drive",
        amplitude: true,
    },
];

pub(super) fn title(selector: ModelSelector) -> String {
    match selector {
        ModelSelector::Nominal => "Resistor flicker noise".to_string(),
        ModelSelector::Broken => "Resistor flicker noise (broken model)".to_string(),
    }
}
