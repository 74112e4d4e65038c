/// Tunable parameters for line breaking and pagination.
///
/// The defaults reproduce classic optimal-fit paragraph breaking behavior;
/// they only need adjusting for unusual typography (very narrow measures,
/// aggressive hyphenation, looser widow policies).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutConfig {
    /// Maximum acceptable adjustment ratio for a line during the optimal
    /// breaking pass. Lines needing more stretch than this are rejected as
    /// candidates at the current tolerance.
    pub tolerance: f32,
    /// How much the tolerance grows per escalation round when no legal break
    /// set exists at the current value.
    pub tolerance_step: f32,
    /// Hard ceiling for tolerance escalation. Beyond this the breaker gives
    /// up on the optimal pass and falls back to greedy best-fit.
    pub max_tolerance: f32,
    /// Flat demerit added per line, discouraging solutions with more lines.
    pub line_penalty: f32,
    /// Demerit for two consecutive hyphenated line endings.
    pub flagged_demerit: f32,
    /// Demerit for adjacent lines whose fitness classes differ by more
    /// than one step.
    pub fitness_demerit: f32,
    /// Cost attached to breaking at a hyphenation opportunity.
    pub hyphen_penalty: f32,
    /// Interword glue stretchability as a fraction of the space advance.
    pub glue_stretch: f32,
    /// Interword glue shrinkability as a fraction of the space advance.
    pub glue_shrink: f32,
    /// Minimum lines kept with the start of a paragraph when it splits
    /// across pages.
    pub orphans: usize,
    /// Minimum lines kept together at the end of a split paragraph.
    pub widows: usize,
    /// Font size applied to runs that do not declare one.
    pub default_font_size: f32,
    /// Line height multiplier applied when neither the run attributes nor
    /// the font metrics provide a usable height.
    pub default_line_height_factor: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            tolerance: 4.0,
            tolerance_step: 5.0,
            max_tolerance: 50.0,
            line_penalty: 10.0,
            flagged_demerit: 100.0,
            fitness_demerit: 3000.0,
            hyphen_penalty: 100.0,
            glue_stretch: 0.5,
            glue_shrink: 1.0 / 3.0,
            orphans: 2,
            widows: 2,
            default_font_size: 12.0,
            default_line_height_factor: 1.2,
        }
    }
}
