//! Fixed-width multi-channel sample values.
//!
//! `Frame<N>` owns one sample per channel, `FrameRef<N>` points at one sample
//! per channel inside pool buffers. Both support channel-wise arithmetic, so
//! panning and mixing read like scalar math:
//!
//! ```
//! use otto_core::{audio::Frame, frame};
//!
//! let pan = frame![0.75, 1.25];
//! let out: Frame<2> = pan * 0.5 + 0.125;
//! assert_eq!(out, frame![0.5, 0.75]);
//! ```

use std::{
    cell::Cell,
    cmp::Ordering,
    fmt,
    ops::{Add, AddAssign, Div, DivAssign, Index, IndexMut, Mul, MulAssign, Neg, Sub, SubAssign},
};

/// Build a [`Frame`] from one expression per channel.
#[macro_export]
macro_rules! frame {
    ($($sample:expr),+ $(,)?) => {
        $crate::audio::Frame::new([$(($sample) as f32),+])
    };
}

/// One sample for each of `N` channels.
///
/// Ordering is lexicographic over the channels.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Frame<const N: usize>(pub [f32; N]);

impl<const N: usize> Frame<N> {
    pub const CHANNELS: usize = N;

    pub const fn new(samples: [f32; N]) -> Self {
        Self(samples)
    }

    /// Same value on every channel.
    pub const fn splat(value: f32) -> Self {
        Self([value; N])
    }

    pub fn transform(self, f: impl Fn(f32) -> f32) -> Self {
        Self(self.0.map(f))
    }

    /// Combine channel by channel with `other`.
    pub fn transform_with(self, other: Self, f: impl Fn(f32, f32) -> f32) -> Self {
        Self(std::array::from_fn(|i| f(self.0[i], other.0[i])))
    }

    pub fn transform_in_place(&mut self, f: impl Fn(f32) -> f32) -> &mut Self {
        for sample in &mut self.0 {
            *sample = f(*sample);
        }
        self
    }

    pub fn transform_with_in_place(&mut self, other: Self, f: impl Fn(f32, f32) -> f32) -> &mut Self {
        for (sample, rhs) in self.0.iter_mut().zip(other.0) {
            *sample = f(*sample, rhs);
        }
        self
    }

    pub fn sum(self) -> f32 {
        self.0.iter().sum()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, f32> {
        self.0.iter()
    }
}

impl<const N: usize> Default for Frame<N> {
    fn default() -> Self {
        Self::splat(0.0)
    }
}

impl<const N: usize> From<[f32; N]> for Frame<N> {
    fn from(samples: [f32; N]) -> Self {
        Self(samples)
    }
}

impl<const N: usize> Index<usize> for Frame<N> {
    type Output = f32;

    fn index(&self, channel: usize) -> &f32 {
        &self.0[channel]
    }
}

impl<const N: usize> IndexMut<usize> for Frame<N> {
    fn index_mut(&mut self, channel: usize) -> &mut f32 {
        &mut self.0[channel]
    }
}

impl<const N: usize> Neg for Frame<N> {
    type Output = Frame<N>;

    fn neg(self) -> Frame<N> {
        self.transform(|s| -s)
    }
}

/// One sample slot per channel, borrowed from pool buffers.
///
/// Writes go straight to the buffers. Arithmetic produces an owned
/// [`Frame`]; the compound assignment operators write back.
#[derive(Clone, Copy)]
pub struct FrameRef<'a, const N: usize>([&'a Cell<f32>; N]);

impl<'a, const N: usize> FrameRef<'a, N> {
    pub fn new(cells: [&'a Cell<f32>; N]) -> Self {
        Self(cells)
    }

    /// Snapshot of the current values.
    pub fn get(&self) -> Frame<N> {
        Frame(self.0.map(Cell::get))
    }

    pub fn set(&self, frame: Frame<N>) {
        for (cell, value) in self.0.iter().zip(frame.0) {
            cell.set(value);
        }
    }

    pub fn channel(&self, channel: usize) -> f32 {
        self.0[channel].get()
    }

    pub fn set_channel(&self, channel: usize, value: f32) {
        self.0[channel].set(value);
    }

    pub fn transform(&self, f: impl Fn(f32) -> f32) -> Frame<N> {
        self.get().transform(f)
    }

    pub fn transform_in_place(&self, f: impl Fn(f32) -> f32) {
        for cell in self.0 {
            cell.set(f(cell.get()));
        }
    }
}

impl<const N: usize> From<FrameRef<'_, N>> for Frame<N> {
    fn from(frame: FrameRef<'_, N>) -> Self {
        frame.get()
    }
}

impl<const N: usize> PartialEq<Frame<N>> for FrameRef<'_, N> {
    fn eq(&self, other: &Frame<N>) -> bool {
        self.get() == *other
    }
}

impl<const N: usize> PartialOrd<Frame<N>> for FrameRef<'_, N> {
    fn partial_cmp(&self, other: &Frame<N>) -> Option<Ordering> {
        self.get().partial_cmp(other)
    }
}

impl<const N: usize> fmt::Debug for FrameRef<'_, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("FrameRef").field(&self.get().0).finish()
    }
}

macro_rules! frame_ops {
    ($($op:ident $method:ident $assign:ident $assign_method:ident $sym:tt),* $(,)?) => {$(
        impl<const N: usize> $op for Frame<N> {
            type Output = Frame<N>;
            #[inline]
            fn $method(self, rhs: Frame<N>) -> Frame<N> {
                self.transform_with(rhs, |a, b| a $sym b)
            }
        }

        impl<const N: usize> $op<f32> for Frame<N> {
            type Output = Frame<N>;
            #[inline]
            fn $method(self, rhs: f32) -> Frame<N> {
                self.transform(|a| a $sym rhs)
            }
        }

        impl<const N: usize> $op<Frame<N>> for f32 {
            type Output = Frame<N>;
            #[inline]
            fn $method(self, rhs: Frame<N>) -> Frame<N> {
                rhs.transform(|b| self $sym b)
            }
        }

        impl<const N: usize> $assign for Frame<N> {
            #[inline]
            fn $assign_method(&mut self, rhs: Frame<N>) {
                *self = *self $sym rhs;
            }
        }

        impl<const N: usize> $assign<f32> for Frame<N> {
            #[inline]
            fn $assign_method(&mut self, rhs: f32) {
                *self = *self $sym rhs;
            }
        }

        impl<const N: usize> $op<Frame<N>> for FrameRef<'_, N> {
            type Output = Frame<N>;
            #[inline]
            fn $method(self, rhs: Frame<N>) -> Frame<N> {
                self.get() $sym rhs
            }
        }

        impl<const N: usize> $op<f32> for FrameRef<'_, N> {
            type Output = Frame<N>;
            #[inline]
            fn $method(self, rhs: f32) -> Frame<N> {
                self.get() $sym rhs
            }
        }

        impl<const N: usize> $op<FrameRef<'_, N>> for Frame<N> {
            type Output = Frame<N>;
            #[inline]
            fn $method(self, rhs: FrameRef<'_, N>) -> Frame<N> {
                self $sym rhs.get()
            }
        }

        impl<const N: usize> $op<FrameRef<'_, N>> for f32 {
            type Output = Frame<N>;
            #[inline]
            fn $method(self, rhs: FrameRef<'_, N>) -> Frame<N> {
                self $sym rhs.get()
            }
        }

        impl<const N: usize> $assign<Frame<N>> for FrameRef<'_, N> {
            #[inline]
            fn $assign_method(&mut self, rhs: Frame<N>) {
                self.set(self.get() $sym rhs);
            }
        }

        impl<const N: usize> $assign<f32> for FrameRef<'_, N> {
            #[inline]
            fn $assign_method(&mut self, rhs: f32) {
                self.set(self.get() $sym rhs);
            }
        }
    )*};
}

frame_ops!(
    Add add AddAssign add_assign +,
    Sub sub SubAssign sub_assign -,
    Mul mul MulAssign mul_assign *,
    Div div DivAssign div_assign /,
);

/// Walk `N` channel buffers side by side, one [`FrameRef`] per sample index.
///
/// Stops at the shortest channel.
pub fn zip_channels<'a, const N: usize>(channels: [&'a [Cell<f32>]; N]) -> ZipChannels<'a, N> {
    let len = channels.iter().map(|c| c.len()).min().unwrap_or(0);
    ZipChannels {
        channels,
        index: 0,
        len,
    }
}

pub struct ZipChannels<'a, const N: usize> {
    channels: [&'a [Cell<f32>]; N],
    index: usize,
    len: usize,
}

impl<'a, const N: usize> Iterator for ZipChannels<'a, N> {
    type Item = FrameRef<'a, N>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.len {
            return None;
        }
        let i = self.index;
        self.index += 1;
        Some(FrameRef(std::array::from_fn(|c| &self.channels[c][i])))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.len - self.index;
        (remaining, Some(remaining))
    }
}

impl<const N: usize> ExactSizeIterator for ZipChannels<'_, N> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_arithmetic_is_channel_wise() {
        let a = frame![1.0, 2.0];
        let b = frame![3.0, 5.0];

        assert_eq!(a + b, frame![4.0, 7.0]);
        assert_eq!(b - a, frame![2.0, 3.0]);
        assert_eq!(a * b, frame![3.0, 10.0]);
        assert_eq!(b / a, frame![3.0, 2.5]);
    }

    #[test]
    fn test_scalar_broadcasts_on_both_sides() {
        let a = frame![1.0, -2.0, 4.0];

        assert_eq!(a * 2.0, frame![2.0, -4.0, 8.0]);
        assert_eq!(2.0 * a, frame![2.0, -4.0, 8.0]);
        assert_eq!(1.0 - a, frame![0.0, 3.0, -3.0]);
        assert_eq!(8.0 / a, frame![8.0, -4.0, 2.0]);
    }

    #[test]
    fn test_compound_assignment() {
        let mut a = frame![1.0, 1.0];
        a += frame![0.5, 1.5];
        a *= 2.0;
        assert_eq!(a, frame![3.0, 5.0]);
    }

    #[test]
    fn test_comparison_is_lexicographic() {
        assert!(frame![1.0, 9.0] < frame![2.0, 0.0]);
        assert!(frame![1.0, 1.0] < frame![1.0, 2.0]);
        assert!(frame![1.0, 2.0] >= frame![1.0, 2.0]);
        assert_ne!(frame![1.0, 2.0], frame![2.0, 1.0]);
    }

    #[test]
    fn test_transform_variants() {
        let mut a = frame![1.0, 4.0];
        assert_eq!(a.transform(f32::sqrt), frame![1.0, 2.0]);

        a.transform_with_in_place(frame![1.0, 2.0], f32::max);
        assert_eq!(a, frame![1.0, 4.0]);
        assert_eq!(a.sum(), 5.0);
    }

    #[test]
    fn test_frame_ref_writes_through() {
        let left = [Cell::new(1.0), Cell::new(2.0)];
        let right = [Cell::new(3.0), Cell::new(4.0)];

        for mut frame in zip_channels([&left[..], &right[..]]) {
            frame *= frame![0.5, 2.0];
        }

        assert_eq!(left[1].get(), 1.0);
        assert_eq!(right[1].get(), 8.0);
    }

    #[test]
    fn test_frame_ref_snapshot_is_detached() {
        let cells = [Cell::new(0.25), Cell::new(0.75)];
        let frame_ref = FrameRef::new([&cells[0], &cells[1]]);

        let snapshot: Frame<2> = frame_ref.into();
        frame_ref.set(Frame::splat(0.0));

        assert_eq!(snapshot, frame![0.25, 0.75]);
        assert_eq!(frame_ref, Frame::splat(0.0));
    }

    #[test]
    fn test_zip_channels_stops_at_shortest() {
        let long = [Cell::new(0.0), Cell::new(0.0), Cell::new(0.0)];
        let short = [Cell::new(0.0)];

        assert_eq!(zip_channels([&long[..], &short[..]]).len(), 1);
    }
}
