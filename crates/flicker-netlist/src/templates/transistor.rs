//! Transistor experiment.
//!
//! An NMOS transistor with its gate held at a constant bias is compared to
//! one whose gate is driven by a sine wave around the same bias.

use crate::template::Template;

const PARAMETERS: &str = r#"
# drive
freq = 2**17 "Hz"          -- frequency of the sinusoidal gate drive
ampl = 100mV               -- amplitude of the sinusoidal gate drive

# transistor
vg = 600mV                 -- gate bias
vd = 1.2V                  -- drain bias
w = 1um                    -- gate width
l = 100nm                  -- gate length

# analyses
sidebands = 10             -- noise sidebands included in pnoise
harms = 2*sidebands        -- harmonics computed by pss
period = 1/freq "s"        -- period of the drive
tstab = 10*period "s"      -- stabilization time before pss
fstart = 1Hz               -- start of the noise sweep
fstop = freq/2 "Hz"        -- end of the noise sweep
pts = 20                   -- points per decade of the noise sweep
"#;

const SKELETON: &str = r#"// Flicker noise of an NMOS transistor with DC and sinusoidal gate drives
simulator lang=spectre
include "{{model}}"

// transistor with a constant gate bias
Vgdc (gdc 0) vsource dc={{vg}}
Vddc (ddc 0) vsource dc={{vd}}
Mdc (ddc gdc 0 0) nmos w={{w}} l={{l}}

// transistor with a sinusoidal gate drive around the same bias
Vgsin (gsin 0) vsource dc={{vg}} type=sine ampl={{ampl}} freq={{freq}}
Vdsin (dsin 0) vsource dc={{vd}}
Msin (dsin gsin 0 0) nmos w={{w}} l={{l}}

pss pss fund={{freq}} harms={{harms}} tstab={{tstab}} errpreset=conservative
pnoiseDC (ddc 0) pnoise start={{fstart}} stop={{fstop}} dec={{pts}} \
    maxsideband={{sidebands}} oprobe=Vddc noisetype=timeaverage
pnoiseSin (dsin 0) pnoise start={{fstart}} stop={{fstop}} dec={{pts}} \
    maxsideband={{sidebands}} oprobe=Vdsin noisetype=timeaverage
"#;

pub const TRANSISTOR: Template = Template::new(
    "transistor",
    SKELETON,
    &[
        "model",
        "vg",
        "vd",
        "w",
        "l",
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
