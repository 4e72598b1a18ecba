/// A scalar that can be stored in a timestep slot.
///
/// Every slot on disk is an `f32`, so wider types are narrowed. Integers
/// beyond 2^24 and `f64` values lose precision the same way an `as f32`
/// cast does.
pub trait Loggable: Copy {
    /// Converts self into the stored representation.
    fn to_f32(self) -> f32;
}

macro_rules! impl_loggable_as {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Loggable for $ty {
                #[inline(always)]
                fn to_f32(self) -> f32 {
                    self as f32
                }
            }
        )*
    };
}

impl_loggable_as!(f32, f64, i8, i16, i32, i64, u8, u16, u32, u64, isize, usize);

impl Loggable for bool {
    #[inline(always)]
    fn to_f32(self) -> f32 {
        if self {
            1.0
        } else {
            0.0
        }
    }
}
