//! Plain-text rendering of the advisor panels.

use std::fmt;

use crate::advice::{
    Urgency, CURRENT_COST_INR, EMISSION_REDUCTION, ESTIMATED_COST, RECOMMENDED_WINDOW,
    SUGGESTED_COST_INR, WINDOW_SUBTITLE,
};
use crate::client::Analysis;
use crate::inputs::ChargingInputs;

const BAR_WIDTH: usize = 40;
const RULE: &str = "────────────────────────────────────────────────────────────";

/// One rendered dashboard: inputs, model answers and chart data.
pub struct Report<'a> {
    pub inputs: &'a ChargingInputs,
    pub analysis: &'a Analysis,
    pub hourly_intensity: &'a [u32],
}

impl Report<'_> {
    pub fn urgency(&self) -> Urgency {
        Urgency::from_cluster(self.analysis.cluster)
    }
}

fn bar(value: u32, max: u32) -> String {
    let len = if max == 0 {
        0
    } else {
        (value as usize * BAR_WIDTH + max as usize / 2) / max as usize
    };
    "█".repeat(len)
}

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "⚡ Carbon-Smart EV Charging Advisor")?;
        writeln!(
            f,
            "Schedules EV charging during low-carbon, low-cost grid periods while respecting user urgency."
        )?;
        writeln!(f, "{RULE}")?;

        writeln!(f, "🔌 Charging Behaviour")?;
        writeln!(f, "  Arrival Hour             {}", self.inputs.arrival_hour)?;
        writeln!(f, "  Charging Duration (hrs)  {:.1}", self.inputs.charging_duration)?;
        writeln!(f, "  Energy Required (kWh)    {:.1}", self.inputs.energy_consumed)?;
        writeln!(
            f,
            "  Start Time               {}",
            self.inputs.start_time.format("%Y-%m-%d %H:%M")
        )?;
        writeln!(f, "{RULE}")?;

        writeln!(f, "✅ Recommended Charging Window")?;
        writeln!(f, "  {RECOMMENDED_WINDOW}")?;
        writeln!(f, "  {WINDOW_SUBTITLE}")?;
        writeln!(f)?;
        writeln!(
            f,
            "  🌿 Carbon Intensity     {:.1} gCO₂/kWh",
            self.analysis.carbon_intensity
        )?;
        writeln!(f, "  💰 Estimated Cost       {ESTIMATED_COST}")?;
        writeln!(f, "  📉 Emission Reduction   {EMISSION_REDUCTION}")?;
        writeln!(f)?;
        let urgency = self.urgency();
        writeln!(f, "  {}: {}", urgency.badge(), urgency.message())?;
        writeln!(f, "{RULE}")?;

        writeln!(f, "📊 Charging Insights")?;
        writeln!(f, "  Hourly carbon intensity (gCO₂/kWh)")?;
        let max = self.hourly_intensity.iter().copied().max().unwrap_or(0);
        for (hour, v) in self.hourly_intensity.iter().enumerate() {
            writeln!(f, "  {:02} {} {}", hour, bar(*v, max), v)?;
        }
        writeln!(f)?;
        writeln!(f, "  Cost Comparison (₹)")?;
        writeln!(
            f,
            "  Current   {} ₹{}",
            bar(CURRENT_COST_INR, CURRENT_COST_INR),
            CURRENT_COST_INR
        )?;
        writeln!(
            f,
            "  Suggested {} ₹{}",
            bar(SUGGESTED_COST_INR, CURRENT_COST_INR),
            SUGGESTED_COST_INR
        )
    }
}
