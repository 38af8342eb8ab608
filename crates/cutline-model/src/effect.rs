//! Effects applied to items. Time effects carry a scalar that retimes the
//! item; other effects are opaque names passed through serialization.

use crate::metadata::Metadata;

/// What an effect does to the item it is attached to.
#[derive(Debug, Clone, PartialEq)]
pub enum EffectKind {
    /// An opaque effect identified only by its effect name.
    Custom { effect_name: String },
    /// A constant-rate retime. `time_scalar` 0.5 halves playback speed,
    /// 2.0 doubles it, negative values play in reverse.
    LinearTimeWarp { time_scalar: f64 },
    /// Holds the first frame for the item's whole duration.
    FreezeFrame,
}

/// A named effect instance on an item.
#[derive(Debug, Clone, PartialEq)]
pub struct Effect {
    pub name: String,
    pub kind: EffectKind,
    pub metadata: Metadata,
}

impl Effect {
    pub fn new(name: impl Into<String>, effect_name: impl Into<String>) -> Effect {
        Effect {
            name: name.into(),
            kind: EffectKind::Custom {
                effect_name: effect_name.into(),
            },
            metadata: Metadata::new(),
        }
    }

    pub fn linear_time_warp(name: impl Into<String>, time_scalar: f64) -> Effect {
        Effect {
            name: name.into(),
            kind: EffectKind::LinearTimeWarp { time_scalar },
            metadata: Metadata::new(),
        }
    }

    /// Half-speed playback.
    pub fn slow_motion(name: impl Into<String>) -> Effect {
        Effect::linear_time_warp(name, 0.5)
    }

    /// Double-speed playback.
    pub fn fast_forward(name: impl Into<String>) -> Effect {
        Effect::linear_time_warp(name, 2.0)
    }

    /// Normal-speed reverse playback.
    pub fn reverse(name: impl Into<String>) -> Effect {
        Effect::linear_time_warp(name, -1.0)
    }

    pub fn freeze_frame(name: impl Into<String>) -> Effect {
        Effect {
            name: name.into(),
            kind: EffectKind::FreezeFrame,
            metadata: Metadata::new(),
        }
    }

    /// The wire-level effect name for this kind.
    pub fn effect_name(&self) -> &str {
        match &self.kind {
            EffectKind::Custom { effect_name } => effect_name,
            EffectKind::LinearTimeWarp { .. } => "LinearTimeWarp",
            EffectKind::FreezeFrame => "FreezeFrame",
        }
    }

    /// The retime scalar, if this is a time effect. A freeze frame is a
    /// retime with scalar zero.
    pub fn time_scalar(&self) -> Option<f64> {
        match self.kind {
            EffectKind::LinearTimeWarp { time_scalar } => Some(time_scalar),
            EffectKind::FreezeFrame => Some(0.0),
            EffectKind::Custom { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retime_presets() {
        assert_eq!(Effect::slow_motion("slow").time_scalar(), Some(0.5));
        assert_eq!(Effect::fast_forward("fast").time_scalar(), Some(2.0));
        assert_eq!(Effect::reverse("rev").time_scalar(), Some(-1.0));
        assert_eq!(Effect::freeze_frame("hold").time_scalar(), Some(0.0));
    }

    #[test]
    fn custom_effects_have_no_scalar() {
        let blur = Effect::new("soften", "Blur");
        assert_eq!(blur.effect_name(), "Blur");
        assert_eq!(blur.time_scalar(), None);
    }

    #[test]
    fn time_effect_names() {
        assert_eq!(Effect::slow_motion("s").effect_name(), "LinearTimeWarp");
        assert_eq!(Effect::freeze_frame("f").effect_name(), "FreezeFrame");
    }
}
