use std::fmt;
use std::str::FromStr;

/// Screen rectangle in virtual-screen coordinates.
///
/// The corners are stored as given; call [`CaptureRect::normalized`] before
/// using `width`/`height` for a capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CaptureRect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl CaptureRect {
    #[inline]
    pub const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Rectangle spanning two corner points, in whatever order they were picked.
    #[inline]
    pub const fn from_corners(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self::new(x1, y1, x2, y2)
    }

    /// Swap corners so that `left <= right` and `top <= bottom`.
    #[inline]
    pub fn normalized(self) -> Self {
        Self {
            left: self.left.min(self.right),
            top: self.top.min(self.bottom),
            right: self.left.max(self.right),
            bottom: self.top.max(self.bottom),
        }
    }

    #[inline]
    pub fn is_normalized(&self) -> bool {
        self.left <= self.right && self.top <= self.bottom
    }

    /// Signed width; wide enough that extreme corners cannot overflow.
    #[inline]
    pub fn width(&self) -> i64 {
        i64::from(self.right) - i64::from(self.left)
    }

    #[inline]
    pub fn height(&self) -> i64 {
        i64::from(self.bottom) - i64::from(self.top)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }
}

impl fmt::Display for CaptureRect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({},{})-({},{})",
            self.left, self.top, self.right, self.bottom
        )
    }
}

/// Error for a `X1,Y1,X2,Y2` string that is not exactly four integers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseRectError(pub String);

impl fmt::Display for ParseRectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "expected 4 comma separated integers, got '{}'", self.0)
    }
}

impl std::error::Error for ParseRectError {}

impl FromStr for CaptureRect {
    type Err = ParseRectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseRectError(s.to_string());
        let mut values = [0i32; 4];
        let mut parts = s.split(',');

        for slot in values.iter_mut() {
            let part = parts.next().ok_or_else(err)?;
            *slot = part.trim().parse().map_err(|_| err())?;
        }
        if parts.next().is_some() {
            return Err(err());
        }

        let [x1, y1, x2, y2] = values;
        Ok(Self::from_corners(x1, y1, x2, y2))
    }
}
