/*!
    Rational number type for time bases and aspect ratios.
*/

/**
    A rational number, used to represent time bases and aspect ratios
    without floating point error.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rational {
    pub num: i32,
    pub den: i32,
}

impl Rational {
    /**
        Creates a new rational number.

        # Panics

        Panics if the denominator is zero.
    */
    pub const fn new(num: i32, den: i32) -> Self {
        assert!(den != 0, "rational denominator cannot be zero");
        Self { num, den }
    }

    /**
        Returns true if both the numerator and denominator are
        positive. Time bases must satisfy this before any rescaling.
    */
    pub const fn is_valid(self) -> bool {
        self.num > 0 && self.den > 0
    }

    /**
        Converts the rational to a floating point value.
    */
    pub fn to_f64(self) -> f64 {
        self.num as f64 / self.den as f64
    }

    /**
        Returns the multiplicative inverse.

        # Panics

        Panics if the numerator is zero.
    */
    pub const fn invert(self) -> Self {
        Self::new(self.den, self.num)
    }
}

impl From<(i32, i32)> for Rational {
    fn from((num, den): (i32, i32)) -> Self {
        Self::new(num, den)
    }
}

impl From<i32> for Rational {
    fn from(num: i32) -> Self {
        Self::new(num, 1)
    }
}

/**
    Rescales an integer count of `from` units into `to` units.

    Uses 128-bit intermediate math so no representable input can
    overflow, and rounds to the nearest output unit with ties away
    from zero.

    Both time bases must be valid (positive numerator and denominator).
*/
pub fn rescale(value: i64, from: Rational, to: Rational) -> i64 {
    debug_assert!(from.is_valid());
    debug_assert!(to.is_valid());

    let num = value as i128 * from.num as i128 * to.den as i128;
    let den = from.den as i128 * to.num as i128;

    let half = den / 2;
    let rounded = if num >= 0 {
        (num + half) / den
    } else {
        (num - half) / den
    };

    rounded as i64
}
