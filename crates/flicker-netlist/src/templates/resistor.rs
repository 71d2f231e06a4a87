//! Resistor experiment.
//!
//! Two identical resistors are compared: one biased with a DC voltage, the
//! other driven by a sine wave with the same RMS value. A resistor model
//! whose flicker noise follows the instantaneous current shows the noise of
//! the driven resistor folded around the drive harmonics.

use crate::template::Template;

const PARAMETERS: &str = r#"
# drive
freq = 2**17 "Hz"          -- frequency of the sinusoidal drive
ampl = 100mV               -- amplitude of the sinusoidal drive
vrms = ampl/sqrt(2) "V"    -- DC bias with the same power as the drive

# resistor
r = 1kOhm                  -- resistance
kf = 1e-12                 -- flicker noise coefficient
af = 2                     -- flicker noise current exponent

# analyses
sidebands = 10             -- noise sidebands included in pnoise
harms = 2*sidebands        -- harmonics computed by pss
period = 1/freq "s"        -- period of the drive
tstab = 10*period "s"      -- stabilization time before pss
fstart = 1Hz               -- start of the noise sweep
fstop = freq/2 "Hz"        -- end of the noise sweep
pts = 20                   -- points per decade of the noise sweep
"#;

const SKELETON: &str = r#"// Flicker noise of a resistor with DC and sinusoidal drives
simulator lang=spectre
ahdl_include "{{model}}"

// resistor biased at a constant voltage
Vdc (dc 0) vsource dc={{vrms}}
Rdc (dc 0) flicker_resistor r={{r}} kf={{kf}} af={{af}}

// resistor driven by a sine wave of the same power
Vsin (sin 0) vsource type=sine ampl={{ampl}} freq={{freq}}
Rsin (sin 0) flicker_resistor r={{r}} kf={{kf}} af={{af}}

pss pss fund={{freq}} harms={{harms}} tstab={{tstab}} errpreset=conservative
pnoiseDC (dc 0) pnoise start={{fstart}} stop={{fstop}} dec={{pts}} \
    maxsideband={{sidebands}} oprobe=Vdc noisetype=timeaverage
pnoiseSin (sin 0) pnoise start={{fstart}} stop={{fstop}} dec={{pts}} \
    maxsideband={{sidebands}} oprobe=Vsin noisetype=timeaverage
"#;

pub const RESISTOR: Template = Template::new(
    "resistor",
    SKELETON,
    &[
        "model",
        "vrms",
        "r",
        "kf",
        "af",
        "ampl",
        "freq",
        "harms",
        "tstab",
        "fstart",
        "fstop",
        "pts",
        "sidebands",
    ],
    PARAMETERS,
);
