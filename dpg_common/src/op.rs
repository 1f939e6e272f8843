/// Lifts `std::ops` operator implementations onto single-field newtypes.
///
/// The newtype must be a tuple struct whose only field supports the requested operator.
#[macro_export]
macro_rules! op {
    (binary $t:ty, $op:ident, $f:ident) => {
        impl std::ops::$op for $t {
            type Output = Self;

            fn $f(self, rhs: Self) -> Self::Output {
                Self(std::ops::$op::$f(self.0, rhs.0))
            }
        }
    };
    (inplace $t:ty, $op:ident, $f:ident) => {
        impl std::ops::$op for $t {
            fn $f(&mut self, rhs: Self) {
                std::ops::$op::$f(&mut self.0, rhs.0)
            }
        }
    };
    (unary $t:ty, $op:ident, $f:ident) => {
        impl std::ops::$op for $t {
            type Output = Self;

            fn $f(self) -> Self::Output {
                Self(std::ops::$op::$f(self.0))
            }
        }
    };
}
