//! Hints Module
//!
//! Decoding of ICCCM/EWMH window hints (WM_NORMAL_HINTS, WM_HINTS, WM_CLASS,
//! _NET_WM_STRUT[_PARTIAL]) from raw property values, and the size-hint
//! constraints applied during placement.

/// WM_SIZE_HINTS flag bits
pub const P_MIN_SIZE: u32 = 1 << 4;
pub const P_MAX_SIZE: u32 = 1 << 5;
pub const P_RESIZE_INC: u32 = 1 << 6;
pub const P_ASPECT: u32 = 1 << 7;
pub const P_BASE_SIZE: u32 = 1 << 8;

/// WM_HINTS flag bits
pub const INPUT_HINT: u32 = 1 << 0;
pub const URGENCY_HINT: u32 = 1 << 8;

/// Smallest width or height a window is shrunk to when it declares no minimum.
pub const MIN_WINDOW_SIZE: i32 = 16;

/// Size hints (XSizeHints equivalent)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SizeHints {
    pub flags: u32,
    pub min_width: i32,
    pub min_height: i32,
    pub max_width: i32,
    pub max_height: i32,
    pub width_inc: i32,
    pub height_inc: i32,
    pub min_aspect_num: i32,
    pub min_aspect_den: i32,
    pub max_aspect_num: i32,
    pub max_aspect_den: i32,
    pub base_width: i32,
    pub base_height: i32,
}

impl SizeHints {
    /// Decode the 18-value WM_SIZE_HINTS property. Older clients write only
    /// the first 15 values (no base size or gravity).
    pub fn from_values(values: &[u32]) -> Option<Self> {
        if values.len() < 15 {
            return None;
        }
        let v = |i: usize| values.get(i).copied().unwrap_or(0) as i32;
        Some(Self {
            flags: values[0],
            min_width: v(5),
            min_height: v(6),
            max_width: v(7),
            max_height: v(8),
            width_inc: v(9),
            height_inc: v(10),
            min_aspect_num: v(11),
            min_aspect_den: v(12),
            max_aspect_num: v(13),
            max_aspect_den: v(14),
            base_width: v(15),
            base_height: v(16),
        })
    }

    fn has(&self, flag: u32) -> bool {
        self.flags & flag != 0
    }

    /// Constrain a requested size. `limit` is the fallback maximum used
    /// when the client declares none.
    pub fn constrain(&self, width: i32, height: i32, limit: (i32, i32)) -> (i32, i32) {
        let (min_w, min_h) = if self.has(P_MIN_SIZE) {
            (self.min_width, self.min_height)
        } else {
            (MIN_WINDOW_SIZE, MIN_WINDOW_SIZE)
        };
        let (max_w, max_h) = if self.has(P_MAX_SIZE) && self.max_width > 0 && self.max_height > 0 {
            (self.max_width, self.max_height)
        } else {
            limit
        };

        let mut w = width.max(min_w).min(max_w);
        let mut h = height.max(min_h).min(max_h);

        if self.has(P_RESIZE_INC) {
            let (base_w, base_h) = if self.has(P_BASE_SIZE) {
                (self.base_width, self.base_height)
            } else {
                (0, 0)
            };
            if self.width_inc > 0 && w > base_w {
                w -= (w - base_w) % self.width_inc;
            }
            if self.height_inc > 0 && h > base_h {
                h -= (h - base_h) % self.height_inc;
            }
        }

        if self.has(P_ASPECT)
            && self.min_aspect_den > 0
            && self.max_aspect_den > 0
            && self.min_aspect_num > 0
            && self.max_aspect_num > 0
            && h > 0
        {
            let ratio = w as f64 / h as f64;
            let min_ratio = self.min_aspect_num as f64 / self.min_aspect_den as f64;
            let max_ratio = self.max_aspect_num as f64 / self.max_aspect_den as f64;
            if ratio < min_ratio {
                h = (w as f64 / min_ratio) as i32;
            } else if ratio > max_ratio {
                w = (h as f64 * max_ratio) as i32;
            }
        }

        (w, h)
    }
}

/// WM hints (XWMHints equivalent, only the fields we act on)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WmHints {
    pub flags: u32,
    pub input: bool,
    pub window_group: Option<u32>,
}

impl WmHints {
    pub fn from_values(values: &[u32]) -> Option<Self> {
        let flags = *values.first()?;
        Some(Self {
            flags,
            input: values.get(1).is_some_and(|&v| v != 0),
            window_group: values.get(8).copied().filter(|&g| g != 0),
        })
    }

    /// The client asked to be given input focus explicitly.
    pub fn accepts_input(&self) -> bool {
        self.flags & INPUT_HINT != 0 && self.input
    }

    pub fn is_urgent(&self) -> bool {
        self.flags & URGENCY_HINT != 0
    }
}

/// Panel edge reservation (_NET_WM_STRUT_PARTIAL layout)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Strut {
    pub left: i32,
    pub right: i32,
    pub top: i32,
    pub bottom: i32,
    pub left_start_y: i32,
    pub left_end_y: i32,
    pub right_start_y: i32,
    pub right_end_y: i32,
    pub top_start_x: i32,
    pub top_end_x: i32,
    pub bottom_start_x: i32,
    pub bottom_end_x: i32,
    /// Legacy _NET_WM_STRUT: every margin spans its whole edge.
    pub full_edges: bool,
}

impl Strut {
    /// Decode _NET_WM_STRUT_PARTIAL (12 values).
    pub fn from_partial(values: &[u32]) -> Option<Self> {
        if values.len() < 12 {
            return None;
        }
        let v = |i: usize| cardinal(values[i]);
        Some(Self {
            left: v(0),
            right: v(1),
            top: v(2),
            bottom: v(3),
            left_start_y: v(4),
            left_end_y: v(5),
            right_start_y: v(6),
            right_end_y: v(7),
            top_start_x: v(8),
            top_end_x: v(9),
            bottom_start_x: v(10),
            bottom_end_x: v(11),
            full_edges: false,
        })
    }

    /// Decode legacy _NET_WM_STRUT (4 values).
    pub fn from_legacy(values: &[u32]) -> Option<Self> {
        if values.len() < 4 {
            return None;
        }
        Some(Self {
            left: cardinal(values[0]),
            right: cardinal(values[1]),
            top: cardinal(values[2]),
            bottom: cardinal(values[3]),
            full_edges: true,
            ..Self::default()
        })
    }

    pub fn is_empty(&self) -> bool {
        self.left <= 0 && self.right <= 0 && self.top <= 0 && self.bottom <= 0
    }
}

/// CARDINAL property value as a saturated `i32`.
fn cardinal(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

/// Extract the class (second string) from a WM_CLASS property value.
pub fn parse_wm_class(value: &[u8]) -> Option<String> {
    let mut parts = value.split(|&b| b == 0);
    let _instance = parts.next()?;
    let class = parts.next()?;
    if class.is_empty() {
        return None;
    }
    Some(String::from_utf8_lossy(class).into_owned())
}
