use std::fmt;

use crate::{
    astro::{Horizon, Phase},
    interpreter::value::core::{Season, ValueKind},
};

/// Number of arguments a function accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Exactly `n` arguments.
    Exact(usize),
    /// `n` or more arguments.
    AtLeast(usize),
    /// Between `min` and `max` arguments, inclusive.
    Between(usize, usize),
}

impl Arity {
    /// Whether `count` arguments satisfy this arity.
    /// ## Example
    /// ```
    /// use zmanim_dsl::interpreter::symbols::Arity;
    ///
    /// assert!(Arity::Between(1, 3).accepts(2));
    /// assert!(!Arity::AtLeast(2).accepts(1));
    /// ```
    #[must_use]
    pub const fn accepts(self, count: usize) -> bool {
        match self {
            Self::Exact(n) => count == n,
            Self::AtLeast(n) => count >= n,
            Self::Between(min, max) => count >= min && count <= max,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let plural = |n: usize| if n == 1 { "" } else { "s" };
        match *self {
            Self::Exact(n) => write!(f, "exactly {n} argument{}", plural(n)),
            Self::AtLeast(n) => write!(f, "at least {n} argument{}", plural(n)),
            Self::Between(min, max) => write!(f, "between {min} and {max} arguments"),
        }
    }
}

/// Declares the closed set of functions together with their canonical
/// name, accepted aliases and arity.
///
/// The macro produces:
/// - the `Function` enum,
/// - `Function::ALL`, every function in declaration order,
/// - `Function::name`, `Function::arity` and `Function::from_name`,
/// - `FUNCTION_NAMES`, every spelling accepted in source (aliases included).
macro_rules! functions {
    (
        $(
            $(#[$meta:meta])*
            $variant:ident => {
                name: $name:literal,
                arity: $arity:expr
                $(, aliases: [$($alias:literal),* $(,)?])?
            }
        ),* $(,)?
    ) => {
        /// A function or combinator of the formula language.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Function {
            $(
                $(#[$meta])*
                $variant,
            )*
        }

        impl Function {
            /// Every function, in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant,)*];

            /// The canonical name.
            #[must_use]
            pub const fn name(self) -> &'static str {
                match self {
                    $(Self::$variant => $name,)*
                }
            }

            /// The arity contract enforced by the validator.
            #[must_use]
            pub const fn arity(self) -> Arity {
                match self {
                    $(Self::$variant => $arity,)*
                }
            }

            /// Resolves a canonical name or an alias.
            #[must_use]
            pub fn from_name(name: &str) -> Option<Self> {
                match name {
                    $($name $($(| $alias)*)? => Some(Self::$variant),)*
                    _ => None,
                }
            }
        }

        /// Every function spelling accepted in formula source.
        pub const FUNCTION_NAMES: &[&str] = &[$($name, $($($alias,)*)?)*];
    };
}

functions! {
    /// `solar(angle, direction)`: the instant the sun is `angle` degrees
    /// below the horizon on the side given by `direction`.
    Solar => { name: "solar", arity: Arity::Exact(2) },
    /// `seasonal_solar(angle, direction)`: the equinox offset of a solar
    /// angle, scaled by the ratio of today's day length to the equinox day.
    SeasonalSolar => { name: "seasonal_solar", arity: Arity::Exact(2) },
    /// `proportional_hours(hours[, base])` or
    /// `proportional_hours(hours, start, end)`.
    ProportionalHours => { name: "proportional_hours", arity: Arity::Between(1, 3) },
    /// `proportional_minutes(minutes, direction)`: minutes scaled so that 720
    /// of them span the day.
    ProportionalMinutes => { name: "proportional_minutes", arity: Arity::Exact(2) },
    /// `midpoint(a, b)`.
    Midpoint => { name: "midpoint", arity: Arity::Exact(2) },
    /// `coalesce(a, b, ...)`: the first alternative that succeeds.
    Coalesce => { name: "coalesce", arity: Arity::AtLeast(2), aliases: ["first_valid"] },
    /// `min(a, b, ...)`: the earliest operand that succeeds.
    Min => { name: "min", arity: Arity::AtLeast(2), aliases: ["earlier_of"] },
    /// `max(a, b, ...)`: the latest operand that succeeds.
    Max => { name: "max", arity: Arity::AtLeast(2), aliases: ["later_of"] },
    /// `if(condition, then, else)`.
    If => { name: "if", arity: Arity::Exact(3) },
}

impl Function {
    /// Combinators tolerate failure of some of their operands.
    #[must_use]
    pub const fn is_combinator(self) -> bool {
        matches!(self, Self::Coalesce | Self::Min | Self::Max | Self::If)
    }
}

/// Astronomical events available as bare identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    /// Sunrise over the visible horizon, corrected for refraction and
    /// elevation. `sunrise` is an alias.
    VisibleSunrise,
    /// Sunset over the visible horizon. `sunset` is an alias.
    VisibleSunset,
    /// Center of the sun crossing the geometric horizon at dawn.
    GeometricSunrise,
    /// Center of the sun crossing the geometric horizon at dusk.
    GeometricSunset,
    /// The sun's transit.
    SolarNoon,
    /// Twelve hours before solar noon.
    SolarMidnight,
    /// Sun 6° below the horizon, morning.
    CivilDawn,
    /// Sun 6° below the horizon, evening.
    CivilDusk,
    /// Sun 12° below the horizon, morning.
    NauticalDawn,
    /// Sun 12° below the horizon, evening.
    NauticalDusk,
    /// Sun 18° below the horizon, morning.
    AstronomicalDawn,
    /// Sun 18° below the horizon, evening.
    AstronomicalDusk,
}

impl Primitive {
    /// Resolves a primitive name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "sunrise" | "visible_sunrise" => Self::VisibleSunrise,
            "sunset" | "visible_sunset" => Self::VisibleSunset,
            "geometric_sunrise" => Self::GeometricSunrise,
            "geometric_sunset" => Self::GeometricSunset,
            "solar_noon" => Self::SolarNoon,
            "solar_midnight" => Self::SolarMidnight,
            "civil_dawn" => Self::CivilDawn,
            "civil_dusk" => Self::CivilDusk,
            "nautical_dawn" => Self::NauticalDawn,
            "nautical_dusk" => Self::NauticalDusk,
            "astronomical_dawn" => Self::AstronomicalDawn,
            "astronomical_dusk" => Self::AstronomicalDusk,
            _ => return None,
        })
    }

    /// Depression angle below the horizon and side of the day, for the
    /// primitives defined by a fixed angle.
    #[must_use]
    pub const fn twilight(self) -> Option<(f64, Phase)> {
        match self {
            Self::CivilDawn => Some((6.0, Phase::Morning)),
            Self::CivilDusk => Some((6.0, Phase::Evening)),
            Self::NauticalDawn => Some((12.0, Phase::Morning)),
            Self::NauticalDusk => Some((12.0, Phase::Evening)),
            Self::AstronomicalDawn => Some((18.0, Phase::Morning)),
            Self::AstronomicalDusk => Some((18.0, Phase::Evening)),
            _ => None,
        }
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
                        Self::VisibleSunrise => "sunrise",
                        Self::VisibleSunset => "sunset",
                        Self::GeometricSunrise => "geometric sunrise",
                        Self::GeometricSunset => "geometric sunset",
                        Self::SolarNoon => "solar noon",
                        Self::SolarMidnight => "solar midnight",
                        Self::CivilDawn => "civil dawn",
                        Self::CivilDusk => "civil dusk",
                        Self::NauticalDawn => "nautical dawn",
                        Self::NauticalDusk => "nautical dusk",
                        Self::AstronomicalDawn => "astronomical dawn",
                        Self::AstronomicalDusk => "astronomical dusk",
                    })
    }
}

/// Direction argument of `solar`, `seasonal_solar` and
/// `proportional_minutes`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Before sunrise, i.e. dawn side.
    BeforeSunrise(Horizon),
    /// After sunrise.
    AfterSunrise(Horizon),
    /// Before sunset.
    BeforeSunset(Horizon),
    /// After sunset, i.e. dusk side.
    AfterSunset(Horizon),
    /// Before solar noon.
    BeforeNoon,
    /// After solar noon.
    AfterNoon,
}

impl Direction {
    /// Resolves a direction name.
    ///
    /// ## Example
    /// ```
    /// use zmanim_dsl::{astro::Horizon, interpreter::symbols::Direction};
    ///
    /// assert_eq!(Direction::from_name("after_geometric_sunset"),
    ///            Some(Direction::AfterSunset(Horizon::Geometric)));
    /// assert_eq!(Direction::from_name("before_sunrise"),
    ///            Some(Direction::BeforeSunrise(Horizon::Visible)));
    /// ```
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        use Horizon::{Geometric, Visible};
        Some(match name {
            "before_sunrise" | "before_visible_sunrise" => Self::BeforeSunrise(Visible),
            "before_geometric_sunrise" => Self::BeforeSunrise(Geometric),
            "after_sunrise" | "after_visible_sunrise" => Self::AfterSunrise(Visible),
            "after_geometric_sunrise" => Self::AfterSunrise(Geometric),
            "before_sunset" | "before_visible_sunset" => Self::BeforeSunset(Visible),
            "before_geometric_sunset" => Self::BeforeSunset(Geometric),
            "after_sunset" | "after_visible_sunset" => Self::AfterSunset(Visible),
            "after_geometric_sunset" => Self::AfterSunset(Geometric),
            "before_noon" => Self::BeforeNoon,
            "after_noon" => Self::AfterNoon,
            _ => return None,
        })
    }

    /// Side of the day the direction points to. Solar angles below the
    /// horizon can only be crossed once per side.
    #[must_use]
    pub const fn phase(self) -> Phase {
        match self {
            Self::BeforeSunrise(_) | Self::AfterSunrise(_) | Self::BeforeNoon => Phase::Morning,
            Self::BeforeSunset(_) | Self::AfterSunset(_) | Self::AfterNoon => Phase::Evening,
        }
    }

    /// The outward-facing directions `seasonal_solar` and
    /// `proportional_minutes` accept: before sunrise or after sunset.
    #[must_use]
    pub const fn outward(self) -> Option<(Phase, Horizon)> {
        match self {
            Self::BeforeSunrise(horizon) => Some((Phase::Morning, horizon)),
            Self::AfterSunset(horizon) => Some((Phase::Evening, horizon)),
            _ => None,
        }
    }
}

/// Day definitions accepted as the second argument of
/// `proportional_hours`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Base {
    /// Visible sunrise to visible sunset.
    Gra,
    /// A fixed number of minutes before sunrise to the same after sunset.
    FixedMinutes(u16),
    /// Like [`Base::FixedMinutes`] but in proportional minutes, i.e. scaled
    /// by day length over 720.
    ZmanisMinutes(u16),
    /// Between the sun being this many tenths of a degree below the
    /// horizon in the morning and in the evening.
    Degrees(u16),
    /// Sun 1.583° below the horizon, morning to evening.
    BaalHatanya,
    /// Sunrise to 40 minutes after sunset.
    AteretTorah,
}

impl Base {
    /// Every base name accepted in source.
    pub const NAMES: &'static [&'static str] = &["gra",
                                                 "mga",
                                                 "mga_60",
                                                 "mga_72",
                                                 "mga_90",
                                                 "mga_96",
                                                 "mga_120",
                                                 "mga_72_zmanis",
                                                 "mga_90_zmanis",
                                                 "mga_96_zmanis",
                                                 "mga_16_1",
                                                 "mga_18",
                                                 "mga_19_8",
                                                 "mga_26",
                                                 "baal_hatanya",
                                                 "ateret_torah"];

    /// Resolves a base name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "gra" => Self::Gra,
            "mga" | "mga_72" => Self::FixedMinutes(72),
            "mga_60" => Self::FixedMinutes(60),
            "mga_90" => Self::FixedMinutes(90),
            "mga_96" => Self::FixedMinutes(96),
            "mga_120" => Self::FixedMinutes(120),
            "mga_72_zmanis" => Self::ZmanisMinutes(72),
            "mga_90_zmanis" => Self::ZmanisMinutes(90),
            "mga_96_zmanis" => Self::ZmanisMinutes(96),
            "mga_16_1" => Self::Degrees(161),
            "mga_18" => Self::Degrees(180),
            "mga_19_8" => Self::Degrees(198),
            "mga_26" => Self::Degrees(260),
            "baal_hatanya" => Self::BaalHatanya,
            "ateret_torah" => Self::AteretTorah,
            _ => return None,
        })
    }
}

/// Location and calendar facts usable in `if` conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConditionVar {
    /// Observer latitude in degrees.
    Latitude,
    /// Observer longitude in degrees.
    Longitude,
    /// Observer elevation in meters.
    Elevation,
    /// Visible sunrise to visible sunset.
    DayLength,
    /// Month of the calculation date, 1 to 12.
    Month,
    /// Day of the month, 1 to 31.
    Day,
    /// Ordinal day of the year, 1 to 366.
    DayOfYear,
    /// Month and day of the calculation date, compared against literals
    /// such as `21-May`.
    Date,
    /// Season of the calculation date in the observer's hemisphere.
    Season,
}

impl ConditionVar {
    /// Resolves a condition variable name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "latitude" => Self::Latitude,
            "longitude" => Self::Longitude,
            "elevation" => Self::Elevation,
            "day_length" => Self::DayLength,
            "month" => Self::Month,
            "day" => Self::Day,
            "day_of_year" => Self::DayOfYear,
            "date" => Self::Date,
            "season" => Self::Season,
            _ => return None,
        })
    }

    /// Static kind of the variable.
    #[must_use]
    pub const fn kind(self) -> ValueKind {
        match self {
            Self::DayLength => ValueKind::Duration,
            Self::Date => ValueKind::Date,
            Self::Season => ValueKind::Season,
            _ => ValueKind::Number,
        }
    }
}

/// What a bare identifier refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Symbol {
    /// An astronomical event.
    Primitive(Primitive),
    /// A direction keyword.
    Direction(Direction),
    /// A day definition keyword.
    Base(Base),
    /// A condition variable.
    Condition(ConditionVar),
    /// A season name, compared against `season`.
    Season(Season),
}

impl Symbol {
    /// Classifies a bare identifier.
    ///
    /// ## Example
    /// ```
    /// use zmanim_dsl::interpreter::symbols::{Base, Symbol};
    ///
    /// assert_eq!(Symbol::lookup("mga"), Some(Symbol::Base(Base::FixedMinutes(72))));
    /// assert_eq!(Symbol::lookup("chatzos"), None);
    /// ```
    #[must_use]
    pub fn lookup(name: &str) -> Option<Self> {
        Primitive::from_name(name).map(Self::Primitive)
                                  .or_else(|| Direction::from_name(name).map(Self::Direction))
                                  .or_else(|| Base::from_name(name).map(Self::Base))
                                  .or_else(|| ConditionVar::from_name(name).map(Self::Condition))
                                  .or_else(|| Season::from_name(name).map(Self::Season))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aliases_resolve_to_canonical_functions() {
        assert_eq!(Function::from_name("first_valid"), Some(Function::Coalesce));
        assert_eq!(Function::from_name("earlier_of"), Some(Function::Min));
        assert_eq!(Function::from_name("later_of"), Some(Function::Max));
        assert_eq!(Function::from_name("sqrt"), None);
    }

    #[test]
    fn every_function_name_round_trips() {
        for function in Function::ALL {
            assert_eq!(Function::from_name(function.name()), Some(*function));
        }
        assert_eq!(FUNCTION_NAMES.len(), Function::ALL.len() + 3);
    }

    #[test]
    fn every_base_name_resolves() {
        for name in Base::NAMES {
            assert!(Base::from_name(name).is_some(), "{name} should resolve");
        }
    }

    #[test]
    fn symbol_namespaces_do_not_overlap() {
        for name in Base::NAMES {
            assert!(Primitive::from_name(name).is_none());
            assert!(Direction::from_name(name).is_none());
        }
        assert_eq!(Symbol::lookup("sunrise"), Some(Symbol::Primitive(Primitive::VisibleSunrise)));
        assert_eq!(Symbol::lookup("fall"), Some(Symbol::Season(Season::Autumn)));
        assert_eq!(Symbol::lookup("season"), Some(Symbol::Condition(ConditionVar::Season)));
    }

    #[test]
    fn arity_display() {
        assert_eq!(Arity::Exact(1).to_string(), "exactly 1 argument");
        assert_eq!(Arity::AtLeast(2).to_string(), "at least 2 arguments");
        assert_eq!(Arity::Between(1, 3).to_string(), "between 1 and 3 arguments");
    }
}
