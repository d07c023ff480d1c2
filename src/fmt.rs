// Display formatters
//
//  Copyright (C) 2014-2023 Ryan Specialty, LLC.
//
//  This file is part of Weft.
//
//  This program is free software: you can redistribute it and/or modify
//  it under the terms of the GNU General Public License as published by
//  the Free Software Foundation, either version 3 of the License, or
//  (at your option) any later version.
//
//  This program is distributed in the hope that it will be useful,
//  but WITHOUT ANY WARRANTY; without even the implied warranty of
//  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
//  GNU General Public License for more details.
//
//  You should have received a copy of the GNU General Public License
//  along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! Typed formatting helpers for diagnostic messages.
//!
//! These types create composable formatters for use with [`Display`].
//! Whereas [`Display`] operates on data owned by the type implementing it,
//!   these formatters operate on data provided _to_ them,
//!     which lets diagnostics quote template constructs consistently:
//!
//! ```
//! # use weft::fmt::*;
//! assert_eq!("`@model`", TtDirective::wrap("model").to_string());
//! assert_eq!(
//!     "`<a>` or `<b>`",
//!     OrList::<TtTag>::wrap(&["a", "b"]).to_string()
//! );
//! ```

use std::{
    fmt::{Display, Formatter, Result},
    marker::PhantomData,
};

/// Wrapper for a [`Display`]-able type.
pub trait DisplayWrapper {
    /// Transform inner data and output using the provided [`Formatter`].
    fn fmt<T: Display>(inner: T, f: &mut Formatter) -> Result;

    /// Associate data with a [`DisplayWrapper`] for rendering using
    ///   [`Display`].
    fn wrap<T: Display>(inner: T) -> Wrap<Self, T> {
        Wrap {
            inner,
            _phantom: PhantomData,
        }
    }
}

/// Wrapper with associated data.
pub struct Wrap<W: DisplayWrapper + ?Sized, T: Display> {
    inner: T,
    _phantom: PhantomData<W>,
}

impl<W: DisplayWrapper + ?Sized, T: Display> Display for Wrap<W, T> {
    fn fmt(&self, f: &mut Formatter) -> Result {
        W::fmt(&self.inner, f)
    }
}

/// Markdown-style quote using backticks.
///
/// NB: This does not defend against nested quotes.
pub struct TtQuote;

impl DisplayWrapper for TtQuote {
    fn fmt<T: Display>(inner: T, f: &mut Formatter) -> Result {
        write!(f, "`{inner}`")
    }
}

/// Quoted directive name with its transition,
///   such as `` `@model` ``.
pub struct TtDirective;

impl DisplayWrapper for TtDirective {
    fn fmt<T: Display>(inner: T, f: &mut Formatter) -> Result {
        write!(f, "`@{inner}`")
    }
}

/// Quoted tag name,
///   such as `` `<div>` ``.
pub struct TtTag;

impl DisplayWrapper for TtTag {
    fn fmt<T: Display>(inner: T, f: &mut Formatter) -> Result {
        write!(f, "`<{inner}>`")
    }
}

/// Wrap each item of a list and join them as an English list with a
///   serial comma.
///
/// No conjunction is written for a single item,
///   and the serial comma is omitted for only two items.
pub trait ListDisplayWrapper {
    /// Wrapper applied to each item.
    type Item: DisplayWrapper;

    /// Conjunction preceding the final item.
    const CONJ: &'static str;

    fn fmt<T: Display>(list: &[T], f: &mut Formatter) -> Result {
        let maxi = list.len().saturating_sub(1);

        for (i, x) in list.iter().enumerate() {
            match i {
                0 => (),
                1 if maxi == 1 => write!(f, " {} ", Self::CONJ)?,
                _ if i == maxi => write!(f, ", {} ", Self::CONJ)?,
                _ => f.write_str(", ")?,
            }

            Self::Item::fmt(x, f)?;
        }

        Ok(())
    }

    fn wrap<T: Display>(list: &[T]) -> ListWrap<Self, T> {
        ListWrap {
            list,
            _phantom: PhantomData,
        }
    }
}

/// A list joined by "or".
pub struct OrList<W: DisplayWrapper>(PhantomData<W>);

impl<W: DisplayWrapper> ListDisplayWrapper for OrList<W> {
    type Item = W;
    const CONJ: &'static str = "or";
}

/// List wrapper with associated data.
pub struct ListWrap<'a, W: ListDisplayWrapper + ?Sized, T: Display> {
    list: &'a [T],
    _phantom: PhantomData<W>,
}

impl<'a, W: ListDisplayWrapper + ?Sized, T: Display> Display
    for ListWrap<'a, W, T>
{
    fn fmt(&self, f: &mut Formatter) -> Result {
        W::fmt(self.list, f)
    }
}
