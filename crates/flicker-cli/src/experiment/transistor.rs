use super::CurveSpec;

pub(super) const CURVES: &[CurveSpec] = &[
    CurveSpec {
        analysis: "pnoiseDC",
        kind: "pnoise",
        signal: "out",
        label: "constant gate bias",
        amplitude: true,
    },
    CurveSpec {
        analysis: "pnoiseSin",
        kind: "pnoise",
        signal: "out",
        label: "sinusoidal gate drive",
        amplitude: true,
    },
];

pub(super) fn title() -> String {
    "NMOS flicker noise".to_string()
}
