//! Per-aircraft device layouts.
//!
//! Aircraft place the tablet screen differently inside the panel, so each
//! variant maps to a [`VariantProfile`] looked up once when the session is
//! built.

use crate::geometry::PanelBand;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DeviceVariant {
    #[default]
    Generic,
    Zibo738,
    LevelUp737,
    Felis742,
    JustFlight,
    Ixeg737,
}

impl DeviceVariant {
    pub const ALL: [DeviceVariant; 6] = [
        DeviceVariant::Generic,
        DeviceVariant::Zibo738,
        DeviceVariant::LevelUp737,
        DeviceVariant::Felis742,
        DeviceVariant::JustFlight,
        DeviceVariant::Ixeg737,
    ];

    pub fn name(self) -> &'static str {
        match self {
            DeviceVariant::Generic => "generic",
            DeviceVariant::Zibo738 => "zibo738",
            DeviceVariant::LevelUp737 => "levelup737",
            DeviceVariant::Felis742 => "felis742",
            DeviceVariant::JustFlight => "justflight",
            DeviceVariant::Ixeg737 => "ixeg737",
        }
    }

    /// Parse a configured name, falling back to [`DeviceVariant::Generic`].
    pub fn from_name_or_generic(name: Option<&str>) -> Self {
        match name.map(str::parse::<DeviceVariant>) {
            Some(Ok(variant)) => variant,
            Some(Err(unknown)) => {
                log::warn!("{unknown}, using generic layout");
                DeviceVariant::Generic
            }
            None => DeviceVariant::Generic,
        }
    }

    pub fn profile(self) -> VariantProfile {
        match self {
            DeviceVariant::Zibo738 => VariantProfile {
                band: band(0.022, 0.977),
                back_button: BackButton::Region {
                    width: 0.27,
                    height: 0.09,
                    x: 0.15,
                    y: -0.019,
                },
                back_action: BackAction::HistoryOrHome,
                menu_button_asset: "menu-item-zibo.png",
                menu_button_position: (0.604, 0.4),
            },
            DeviceVariant::LevelUp737 => VariantProfile {
                band: band(0.05, 1.0),
                back_button: BackButton::Region {
                    width: 0.27,
                    height: 0.10,
                    x: 0.15,
                    y: -0.014,
                },
                back_action: BackAction::HistoryOrHome,
                menu_button_asset: "menu-item-levelup737.png",
                menu_button_position: (0.604, 0.43),
            },
            DeviceVariant::Felis742 => VariantProfile {
                band: band(-0.11, 1.06),
                back_button: BackButton::Region {
                    width: 0.27,
                    height: 0.05,
                    x: 0.5,
                    y: 1.092,
                },
                back_action: BackAction::HideAndHome,
                menu_button_asset: "menu-item.png",
                menu_button_position: (0.2, 0.568),
            },
            DeviceVariant::Generic | DeviceVariant::JustFlight | DeviceVariant::Ixeg737 => {
                VariantProfile {
                    band: band(0.0, 0.935),
                    back_button: BackButton::Icon { y: 0.967 },
                    back_action: BackAction::HistoryOrHome,
                    menu_button_asset: "menu-item.png",
                    menu_button_position: (0.2, 0.568),
                }
            }
        }
    }
}

fn band(start: f32, end: f32) -> PanelBand {
    // Table values always satisfy end > start.
    PanelBand::new(start, end).unwrap_or_default()
}

impl fmt::Display for DeviceVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant(pub String);

impl fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown device variant `{}`", self.0)
    }
}

impl std::error::Error for UnknownVariant {}

impl FromStr for DeviceVariant {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        DeviceVariant::ALL
            .into_iter()
            .find(|v| v.name() == lowered)
            .ok_or_else(|| UnknownVariant(s.to_string()))
    }
}

/// Where the host draws the back affordance, in normalized panel coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BackButton {
    /// An icon centred at `y`, inset from the left edge by half its width.
    /// The icon is `arrow-left-circle.svg` when the address bar is hidden,
    /// `x-circle.svg` otherwise.
    Icon { y: f32 },
    /// An invisible hit area over the aircraft's own bezel button.
    Region {
        width: f32,
        height: f32,
        x: f32,
        y: f32,
    },
}

impl BackButton {
    pub fn icon_asset(&self, hide_addressbar: bool) -> Option<&'static str> {
        match self {
            BackButton::Icon { .. } if hide_addressbar => Some("arrow-left-circle.svg"),
            BackButton::Icon { .. } => Some("x-circle.svg"),
            BackButton::Region { .. } => None,
        }
    }
}

/// What pressing the back affordance does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackAction {
    /// Go back in history; go to the device home screen if there is none.
    HistoryOrHome,
    /// Hide the browser and go to the device home screen.
    HideAndHome,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VariantProfile {
    pub band: PanelBand,
    pub back_button: BackButton,
    pub back_action: BackAction,
    pub menu_button_asset: &'static str,
    pub menu_button_position: (f32, f32),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for variant in DeviceVariant::ALL {
            assert_eq!(variant.name().parse::<DeviceVariant>(), Ok(variant));
        }
        assert_eq!("ZIBO738".parse::<DeviceVariant>(), Ok(DeviceVariant::Zibo738));
        assert!("a320".parse::<DeviceVariant>().is_err());
    }

    #[test]
    fn unknown_name_uses_generic() {
        assert_eq!(
            DeviceVariant::from_name_or_generic(Some("concorde")),
            DeviceVariant::Generic
        );
        assert_eq!(DeviceVariant::from_name_or_generic(None), DeviceVariant::Generic);
    }

    #[test]
    fn bands_match_device_layouts() {
        let zibo = DeviceVariant::Zibo738.profile();
        assert_eq!((zibo.band.offset_start(), zibo.band.offset_end()), (0.022, 0.977));
        assert_eq!(zibo.menu_button_asset, "menu-item-zibo.png");

        let felis = DeviceVariant::Felis742.profile();
        assert_eq!((felis.band.offset_start(), felis.band.offset_end()), (-0.11, 1.06));
        assert_eq!(felis.back_action, BackAction::HideAndHome);

        assert_eq!(DeviceVariant::Ixeg737.profile(), DeviceVariant::Generic.profile());
        let generic = DeviceVariant::Generic.profile();
        assert_eq!(generic.band.offset_end(), 0.935);
        assert_eq!(generic.back_button.icon_asset(true), Some("arrow-left-circle.svg"));
    }
}
