// Experience awards and the level curve.

/// XP awarded per in-game accomplishment.
pub const XP_KILL: u32 = 10;
pub const XP_CAPTURE: u32 = 50;
pub const XP_RETURN: u32 = 25;
pub const XP_WIN: u32 = 100;
pub const XP_MVP: u32 = 150;
pub const XP_PARTICIPATION: u32 = 20;

const BASE_XP: u32 = 100;
const XP_MULTIPLIER: f64 = 1.5;

/// Level reached with `experience` total XP. Level 1 starts at 0 XP; each
/// level costs `BASE_XP * XP_MULTIPLIER^(level-1)`. Widened arithmetic so
/// extreme XP totals cannot overflow.
pub fn level_for(experience: u32) -> u32 {
    let experience = experience as u64;
    let mut level = 1u32;
    let mut required = BASE_XP as u64;
    let mut total = 0u64;

    while total + required <= experience {
        total += required;
        level += 1;
        required = (BASE_XP as f64 * XP_MULTIPLIER.powi(level as i32 - 1)) as u64;
    }

    level
}

/// Total XP needed to reach `level` from zero.
pub fn xp_for_level(level: u32) -> u32 {
    if level <= 1 {
        return 0;
    }
    let total: u64 = (1..level)
        .map(|l| (BASE_XP as f64 * XP_MULTIPLIER.powi(l as i32 - 1)) as u64)
        .sum();
    total.min(u32::MAX as u64) as u32
}

/// Coins granted when `level` is reached.
pub fn level_up_coins(level: u32) -> u32 {
    level * 10
}
