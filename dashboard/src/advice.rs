use rand::Rng;
use std::ops::Range;

// Fixed recommendation copy; not derived from the model outputs.
pub const RECOMMENDED_WINDOW: &str = "1:00 AM – 3:00 AM";
pub const WINDOW_SUBTITLE: &str = "Lowest grid emissions & energy cost";
pub const ESTIMATED_COST: &str = "₹72 (Save ₹50)";
pub const EMISSION_REDUCTION: &str = "≈ 45% Cleaner";
pub const CURRENT_COST_INR: u32 = 122;
pub const SUGGESTED_COST_INR: u32 = 72;

/// Cluster labels treated as users who need to charge now.
pub const URGENT_CLUSTERS: [usize; 2] = [0, 3];

pub const HOURLY_INTENSITY_RANGE: Range<u32> = 200..700;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Urgency {
    Urgent,
    Flexible,
}

impl Urgency {
    pub fn from_cluster(cluster: usize) -> Self {
        if URGENT_CLUSTERS.contains(&cluster) {
            Urgency::Urgent
        } else {
            Urgency::Flexible
        }
    }

    pub fn badge(&self) -> &'static str {
        match self {
            Urgency::Urgent => "🚨 Urgent User",
            Urgency::Flexible => "⏳ Flexible User",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Urgency::Urgent => "Immediate charging required.",
            Urgency::Flexible => "Charging can be shifted to cleaner off-peak hours.",
        }
    }
}

/// Illustrative hourly intensities for the insights chart, fresh on every render.
pub fn random_hourly_intensity<R: Rng + ?Sized>(rng: &mut R) -> [u32; 24] {
    std::array::from_fn(|_| rng.gen_range(HOURLY_INTENSITY_RANGE))
}
