//! Operator overloads for the value family.
//!
//! `*` on ciphertexts is the maintained product; use
//! [`Encrypted::multiply_raw`] for the unmaintained one. `<<` rotates left,
//! `>>` rotates right and `!` flips (row swap or conjugation).
//!
//! # Panics
//!
//! Every operator panics where its `try_*` counterpart would return an error:
//! operands from different backends, mismatched scale or level, a ciphertext
//! that is not linear, or an exhausted modulus chain.

use std::ops::{Add, AddAssign, Mul, MulAssign, Neg, Not, Shl, ShlAssign, Shr, ShrAssign, Sub, SubAssign};

use crate::backend::{Backend, Encoded, Encrypted, Vector};
use crate::error::Result;

fn expect_op<T>(result: Result<T>, op: &str) -> T {
    match result {
        Ok(value) => value,
        Err(err) => panic!("{op} failed: {err}"),
    }
}

macro_rules! binary_op {
    ($Lhs:ident, $Rhs:ident, $Trait:ident, $method:ident, $try_method:ident, $name:literal) => {
        impl<'b, B: Backend> $Trait<&$Rhs<'b, B>> for &$Lhs<'b, B> {
            type Output = $Lhs<'b, B>;

            fn $method(self, rhs: &$Rhs<'b, B>) -> $Lhs<'b, B> {
                expect_op(self.$try_method(rhs), $name)
            }
        }

        impl<'b, B: Backend> $Trait<&$Rhs<'b, B>> for $Lhs<'b, B> {
            type Output = $Lhs<'b, B>;

            fn $method(self, rhs: &$Rhs<'b, B>) -> $Lhs<'b, B> {
                expect_op(self.$try_method(rhs), $name)
            }
        }
    };
}

macro_rules! encrypted_assign_op {
    ($Rhs:ident, $Trait:ident, $method:ident, $backend_method:ident, $name:literal) => {
        impl<'b, B: Backend> $Trait<&$Rhs<'b, B>> for Encrypted<'b, B> {
            fn $method(&mut self, rhs: &$Rhs<'b, B>) {
                let backend = self.backend();
                expect_op(Backend::$backend_method(backend, self, rhs).map(|_| ()), $name);
            }
        }
    };
}

binary_op!(Encrypted, Encrypted, Add, add, try_add, "homomorphic addition");
binary_op!(Encrypted, Encoded, Add, add, try_add_plain, "plaintext addition");
binary_op!(Encrypted, Encrypted, Sub, sub, try_sub, "homomorphic subtraction");
binary_op!(Encrypted, Encoded, Sub, sub, try_sub_plain, "plaintext subtraction");
binary_op!(Encrypted, Encrypted, Mul, mul, try_mul, "homomorphic multiplication");
binary_op!(Encrypted, Encoded, Mul, mul, try_mul_plain, "plaintext multiplication");

encrypted_assign_op!(Encrypted, AddAssign, add_assign, add, "homomorphic addition");
encrypted_assign_op!(Encoded, AddAssign, add_assign, add_plain, "plaintext addition");
encrypted_assign_op!(Encrypted, SubAssign, sub_assign, subtract, "homomorphic subtraction");
encrypted_assign_op!(Encoded, SubAssign, sub_assign, subtract_plain, "plaintext subtraction");
encrypted_assign_op!(Encrypted, MulAssign, mul_assign, multiply_and_maintain, "homomorphic multiplication");
encrypted_assign_op!(Encoded, MulAssign, mul_assign, multiply_plain_and_maintain, "plaintext multiplication");

impl<'b, B: Backend> Neg for &Encrypted<'b, B> {
    type Output = Encrypted<'b, B>;

    fn neg(self) -> Encrypted<'b, B> {
        expect_op(self.try_neg(), "negation")
    }
}

impl<'b, B: Backend> Neg for Encrypted<'b, B> {
    type Output = Encrypted<'b, B>;

    fn neg(mut self) -> Encrypted<'b, B> {
        let backend = self.backend();
        expect_op(Backend::negate(backend, &mut self).map(|_| ()), "negation");
        self
    }
}

impl<'b, B: Backend> Shl<i64> for &Encrypted<'b, B> {
    type Output = Encrypted<'b, B>;

    fn shl(self, k: i64) -> Encrypted<'b, B> {
        expect_op(self.try_rotate(k), "rotation")
    }
}

impl<'b, B: Backend> Shr<i64> for &Encrypted<'b, B> {
    type Output = Encrypted<'b, B>;

    fn shr(self, k: i64) -> Encrypted<'b, B> {
        expect_op(self.try_rotate(k.wrapping_neg()), "rotation")
    }
}

impl<B: Backend> ShlAssign<i64> for Encrypted<'_, B> {
    fn shl_assign(&mut self, k: i64) {
        let backend = self.backend();
        expect_op(Backend::rotate(backend, self, k).map(|_| ()), "rotation");
    }
}

impl<B: Backend> ShrAssign<i64> for Encrypted<'_, B> {
    fn shr_assign(&mut self, k: i64) {
        let backend = self.backend();
        expect_op(Backend::rotate(backend, self, k.wrapping_neg()).map(|_| ()), "rotation");
    }
}

impl<'b, B: Backend> Not for &Encrypted<'b, B> {
    type Output = Encrypted<'b, B>;

    fn not(self) -> Encrypted<'b, B> {
        expect_op(self.try_flip(), "flip")
    }
}

binary_op!(Vector, Vector, Add, add, try_add, "vector addition");
binary_op!(Vector, Vector, Sub, sub, try_sub, "vector subtraction");
binary_op!(Vector, Vector, Mul, mul, try_mul, "vector multiplication");

macro_rules! vector_assign_op {
    ($Trait:ident, $method:ident, $try_method:ident, $name:literal) => {
        impl<'b, B: Backend> $Trait<&Vector<'b, B>> for Vector<'b, B> {
            fn $method(&mut self, rhs: &Vector<'b, B>) {
                *self = expect_op(self.$try_method(rhs), $name);
            }
        }
    };
}

vector_assign_op!(AddAssign, add_assign, try_add, "vector addition");
vector_assign_op!(SubAssign, sub_assign, try_sub, "vector subtraction");
vector_assign_op!(MulAssign, mul_assign, try_mul, "vector multiplication");

impl<'b, B: Backend> Neg for &Vector<'b, B> {
    type Output = Vector<'b, B>;

    fn neg(self) -> Vector<'b, B> {
        self.negated()
    }
}

impl<'b, B: Backend> Shl<i64> for &Vector<'b, B> {
    type Output = Vector<'b, B>;

    fn shl(self, k: i64) -> Vector<'b, B> {
        self.rotate(k)
    }
}

impl<'b, B: Backend> Shr<i64> for &Vector<'b, B> {
    type Output = Vector<'b, B>;

    fn shr(self, k: i64) -> Vector<'b, B> {
        self.rotate(k.wrapping_neg())
    }
}

impl<'b, B: Backend> Not for &Vector<'b, B> {
    type Output = Vector<'b, B>;

    fn not(self) -> Vector<'b, B> {
        self.flip()
    }
}
