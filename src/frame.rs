//! Scale-domain-tagged pixel buffers.
//!
//! Each pipeline stage states which domain it accepts and produces; the
//! newtypes below make a buffer from one domain unusable in another without
//! going through the stage that performs the conversion.

use image::GrayImage;
use ndarray::Array2;

use crate::enums::Channel;

/// Raw acquired signal magnitude, unnormalized.
#[derive(Clone, Debug)]
pub struct NativeImage(Array2<f32>);

impl NativeImage {
    pub fn new(data: Array2<f32>) -> Self {
        NativeImage(data)
    }

    pub fn data(&self) -> &Array2<f32> {
        &self.0
    }

    /// (rows, columns)
    pub fn dim(&self) -> (usize, usize) {
        self.0.dim()
    }
}

/// Values linearly rescaled into `[0, 1]`.
///
/// Only the normalizer and the adjuster construct this type, so holding one
/// is proof the `[0, 1]` contract holds.
#[derive(Clone, Debug)]
pub struct NormalizedImage(Array2<f32>);

impl NormalizedImage {
    pub(crate) fn new(data: Array2<f32>) -> Self {
        NormalizedImage(data)
    }

    pub fn data(&self) -> &Array2<f32> {
        &self.0
    }

    pub(crate) fn into_inner(self) -> Array2<f32> {
        self.0
    }

    pub fn dim(&self) -> (usize, usize) {
        self.0.dim()
    }
}

/// 8-bit values derived from the normalized domain solely for rendering and
/// export. Never fed back into the numeric stages.
#[derive(Clone, Debug)]
pub struct DisplayImage(GrayImage);

impl DisplayImage {
    pub(crate) fn new(image: GrayImage) -> Self {
        DisplayImage(image)
    }

    pub fn image(&self) -> &GrayImage {
        &self.0
    }

    /// (width, height)
    pub fn dimensions(&self) -> (u32, u32) {
        self.0.dimensions()
    }
}

/// The four derived views of one scan index, all in a common domain.
#[derive(Clone, Debug)]
pub struct DerivedFrameSet<T> {
    pub in_phase: T,
    pub out_phase: T,
    pub water: T,
    pub fat: T,
}

impl<T> DerivedFrameSet<T> {
    /// Iterate the channels in display order.
    pub fn channels(&self) -> impl Iterator<Item = (Channel, &T)> {
        Channel::ALL.into_iter().zip([
            &self.in_phase,
            &self.out_phase,
            &self.water,
            &self.fat,
        ])
    }

    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> DerivedFrameSet<U> {
        DerivedFrameSet {
            in_phase: f(self.in_phase),
            out_phase: f(self.out_phase),
            water: f(self.water),
            fat: f(self.fat),
        }
    }
}
