// AQI domain model - PM2.5 correction and breakpoint interpolation
use std::fmt;

/// Corrected concentrations above this are reported as [`Aqi::Undefined`].
pub const MAX_CONCENTRATION: f64 = 1000.0;

/// Result of converting a PM2.5 concentration into an AQI value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Aqi {
    /// Interpolated index. A negative value is the sensor's own (invalid)
    /// concentration passed through unclassified.
    Index(f64),
    /// Off-scale or not-a-number concentration.
    Undefined,
}

impl Aqi {
    pub fn value(&self) -> Option<f64> {
        match self {
            Aqi::Index(v) => Some(*v),
            Aqi::Undefined => None,
        }
    }

    /// EPA health category for the index, if it falls on the scale.
    pub fn category(&self) -> Option<&'static str> {
        let v = self.value()?;
        if v < 0.0 {
            return None;
        }
        let name = match v {
            v if v <= 50.0 => "Good",
            v if v <= 100.0 => "Moderate",
            v if v <= 150.0 => "Unhealthy for Sensitive Groups",
            v if v <= 200.0 => "Unhealthy",
            v if v <= 300.0 => "Very Unhealthy",
            _ => "Hazardous",
        };
        Some(name)
    }
}

impl fmt::Display for Aqi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Whole numbers keep their fractional part, e.g. `100.0`.
            Aqi::Index(v) => write!(f, "{:?}", v),
            Aqi::Undefined => write!(f, "-"),
        }
    }
}

/// One band of the AQI breakpoint table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Breakpoint {
    pub concentration_low: f64,
    pub concentration_high: f64,
    pub aqi_low: f64,
    pub aqi_high: f64,
    /// Whether a concentration equal to `concentration_low` selects this band.
    /// Only the lowest band is inclusive; every other guard is a strict `>`,
    /// so e.g. 35.5 falls into the 12.1-35.4 band even though it is listed as
    /// the low breakpoint of 35.5-55.4.
    pub inclusive_low: bool,
}

impl Breakpoint {
    pub const fn new(
        concentration_low: f64,
        concentration_high: f64,
        aqi_low: f64,
        aqi_high: f64,
        inclusive_low: bool,
    ) -> Self {
        Self {
            concentration_low,
            concentration_high,
            aqi_low,
            aqi_high,
            inclusive_low,
        }
    }

    fn matches(&self, concentration: f64) -> bool {
        if self.inclusive_low {
            concentration >= self.concentration_low
        } else {
            concentration > self.concentration_low
        }
    }

    fn score(&self, concentration: f64) -> f64 {
        aqi_from_breakpoints(
            concentration,
            self.aqi_high,
            self.aqi_low,
            self.concentration_high,
            self.concentration_low,
        )
    }
}

/// US EPA PM2.5 breakpoints, ordered from lowest to highest band.
pub const EPA_PM25_BREAKPOINTS: [Breakpoint; 7] = [
    Breakpoint::new(0.0, 12.0, 0.0, 50.0, true),
    Breakpoint::new(12.1, 35.4, 51.0, 100.0, false),
    Breakpoint::new(35.5, 55.4, 101.0, 150.0, false),
    Breakpoint::new(55.5, 150.4, 151.0, 200.0, false),
    Breakpoint::new(150.5, 250.4, 201.0, 300.0, false),
    Breakpoint::new(250.5, 350.4, 301.0, 400.0, false),
    Breakpoint::new(350.5, 500.4, 401.0, 500.0, false),
];

/// Apply the US EPA correction for low-cost PurpleAir sensors.
///
/// The curve is piecewise over the raw concentration. The `[30, 50)` and
/// `[210, 260)` bands blend the neighbouring formulas linearly so the result
/// is continuous. Negative readings are returned unchanged.
pub fn correct_pm25(raw_pm25: f64, humidity: f64) -> f64 {
    let pm = raw_pm25;
    if pm >= 260.0 {
        2.966 + 0.69 * pm + 8.84e-4 * pm * pm
    } else if pm >= 210.0 {
        let t = pm / 50.0 - 21.0 / 5.0;
        (0.69 * t + 0.786 * (1.0 - t)) * pm - 0.0862 * humidity * (1.0 - t)
            + 2.966 * t
            + 5.75 * (1.0 - t)
            + 8.84e-4 * pm * pm * t
    } else if pm >= 50.0 {
        0.786 * pm - 0.0862 * humidity + 5.75
    } else if pm >= 30.0 {
        let t = pm / 20.0 - 3.0 / 2.0;
        (0.786 * t + 0.524 * (1.0 - t)) * pm - 0.0862 * humidity + 5.75
    } else if pm >= 0.0 {
        0.524 * pm - 0.0862 * humidity + 5.75
    } else {
        pm
    }
}

/// Linear interpolation between two breakpoints (the AirNow AQI equation).
///
/// `concentration_high` must differ from `concentration_low`.
pub fn aqi_from_breakpoints(
    concentration: f64,
    aqi_high: f64,
    aqi_low: f64,
    concentration_high: f64,
    concentration_low: f64,
) -> f64 {
    let slope = (aqi_high - aqi_low) / (concentration_high - concentration_low);
    slope * (concentration - concentration_low) + aqi_low
}

/// Classify a (corrected) concentration with the EPA table.
#[allow(dead_code)]
pub fn classify_and_score(concentration: f64) -> Aqi {
    classify_with_table(&EPA_PM25_BREAKPOINTS, concentration)
}

/// Classify a concentration against `table`, ordered lowest band first.
///
/// Bands are tried from the highest down and the first matching guard wins.
pub fn classify_with_table(table: &[Breakpoint], concentration: f64) -> Aqi {
    if concentration.is_nan() || concentration > MAX_CONCENTRATION {
        return Aqi::Undefined;
    }
    if concentration < 0.0 {
        return Aqi::Index(concentration);
    }
    table
        .iter()
        .rev()
        .find(|band| band.matches(concentration))
        .map(|band| Aqi::Index(band.score(concentration)))
        .unwrap_or(Aqi::Undefined)
}

/// PM2.5 to AQI conversion with its configuration constants.
#[derive(Debug, Clone, Copy)]
pub struct AqiConverter {
    breakpoints: &'static [Breakpoint],
    apply_humidity_correction: bool,
}

impl AqiConverter {
    pub fn new(breakpoints: &'static [Breakpoint], apply_humidity_correction: bool) -> Self {
        Self {
            breakpoints,
            apply_humidity_correction,
        }
    }

    pub fn with_humidity_correction(apply_humidity_correction: bool) -> Self {
        Self::new(&EPA_PM25_BREAKPOINTS, apply_humidity_correction)
    }

    pub fn applies_humidity_correction(&self) -> bool {
        self.apply_humidity_correction
    }

    /// Convert a raw PM2.5 reading into an AQI value.
    ///
    /// Without a humidity value the raw concentration is classified as is.
    pub fn get_aqi_from_pm(&self, pm: f64, humidity: Option<f64>) -> Aqi {
        let concentration = match (self.apply_humidity_correction, humidity) {
            (true, Some(rh)) => correct_pm25(pm, rh),
            _ => pm,
        };
        classify_with_table(self.breakpoints, concentration)
    }
}

impl Default for AqiConverter {
    fn default() -> Self {
        Self::with_humidity_correction(true)
    }
}
