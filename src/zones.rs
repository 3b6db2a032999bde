use once_cell::sync::Lazy;
use regex::Regex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoneInfo {
    pub name: &'static str,
    pub color: &'static str,
}

pub const UNKNOWN_ZONE: ZoneInfo = ZoneInfo {
    name: "Unknown zone",
    color: "#ffffff",
};

const UNZONED_COLOR: &str = "#94a3b8";

const ZONE_PALETTE: [&str; 18] = [
    "#60a5fa", "#34d399", "#f59e0b", "#f472b6", "#22d3ee", "#a78bfa", "#f87171", "#10b981",
    "#eab308", "#fb7185", "#38bdf8", "#c084fc", "#fbbf24", "#2dd4bf", "#fca5a5", "#4ade80",
    "#93c5fd", "#fda4af",
];

// Order matters: the first matching prefix wins.
const PREFIX_TABLE: [(&str, ZoneInfo); 15] = [
    ("^06", ZoneInfo { name: "Windsward", color: "#00ffff" }),
    ("^12", ZoneInfo { name: "Monarch's Bluffs", color: "#9ca3af" }),
    ("^(99_|99A_|04A_|EF_)", ZoneInfo { name: "Everfall", color: "#1f3a93" }),
    ("^(99B|02A_)", ZoneInfo { name: "Brightwood", color: "#60a5fa" }),
    ("^(99C|WF|13A_)", ZoneInfo { name: "Weaver's Fen", color: "#a78bfa" }),
    ("^(99D|GC|03)", ZoneInfo { name: "Great Cleave", color: "#f59e0b" }),
    ("^(99E|14)", ZoneInfo { name: "Edengrove", color: "#10b981" }),
    ("^(99F|08)", ZoneInfo { name: "Ebonscale Reach", color: "#b45309" }),
    ("^(99G|07)", ZoneInfo { name: "Shattered Mountain", color: "#ef4444" }),
    ("^(16|BS)", ZoneInfo { name: "Brimstone Sands", color: "#facc15" }),
    ("^09A_", ZoneInfo { name: "Elysian Wilds", color: "#86efac" }),
    ("^15", ZoneInfo { name: "Restless Shore", color: "#ff23da" }),
    ("^11", ZoneInfo { name: "Mourningdale", color: "#3923ff" }),
    ("^05", ZoneInfo { name: "Reekwater", color: "#238aeb" }),
    ("^C10A", ZoneInfo { name: "Cutlass Keys", color: "#fbff00" }),
];

static ZONE_RULES: Lazy<Vec<(Regex, ZoneInfo)>> = Lazy::new(|| {
    PREFIX_TABLE
        .iter()
        .filter_map(|(pattern, info)| Regex::new(pattern).ok().map(|re| (re, *info)))
        .collect()
});

/// Zone name and colour from a quest id prefix. Decoration only.
pub fn zone_by_id_prefix(id: &str) -> ZoneInfo {
    let id = id.trim();
    ZONE_RULES
        .iter()
        .find(|(re, _)| re.is_match(id))
        .map(|(_, info)| *info)
        .unwrap_or(UNKNOWN_ZONE)
}

pub fn zone_color(zone_id: Option<i64>) -> &'static str {
    match zone_id {
        Some(zone) if zone >= 0 => ZONE_PALETTE[(zone as usize) % ZONE_PALETTE.len()],
        _ => UNZONED_COLOR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_matching_prefix_wins() {
        assert_eq!(zone_by_id_prefix("06_intro").name, "Windsward");
        assert_eq!(zone_by_id_prefix("99B_road").name, "Brightwood");
        assert_eq!(zone_by_id_prefix("99_gate").name, "Everfall");
        assert_eq!(zone_by_id_prefix("GC_01").name, "Great Cleave");
        assert_eq!(zone_by_id_prefix("LEVEL_10"), UNKNOWN_ZONE);
    }

    #[test]
    fn palette_wraps_and_handles_unzoned() {
        assert_eq!(zone_color(Some(0)), "#60a5fa");
        assert_eq!(zone_color(Some(18)), "#60a5fa");
        assert_eq!(zone_color(None), UNZONED_COLOR);
        assert_eq!(zone_color(Some(-3)), UNZONED_COLOR);
    }
}
