/*
 * paulchen, a UCI-compatible chess engine
 * Copyright (C) 2024 Jasper Shovelton
 *
 * paulchen is free software: you can redistribute it and/or modify it under
 * the terms of the GNU General Public License as published by the Free
 * Software Foundation, either version 3 of the License, or (at your option)
 * any later version.
 *
 * paulchen is distributed in the hope that it will be useful, but WITHOUT ANY
 * WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
 * FOR A PARTICULAR PURPOSE. See the GNU General Public License for more
 * details.
 *
 * You should have received a copy of the GNU General Public License along
 * with paulchen. If not, see <https://www.gnu.org/licenses/>.
 */

//! [`Depth`] (plies remaining to the search horizon) and [`Height`] (plies
//! played since the root), kept as distinctly-named aliases of the same
//! underlying integer so the two are not accidentally swapped at a call
//! site.

/// Plies remaining to the search horizon. Negative once quiescence search
/// takes over.
pub type Depth = i16;
/// Plies played since the root of the current search.
pub type Height = i16;

/// The deepest any search is allowed to go, in plies from the root. Bounds
/// the size of every per-ply table (killers, the PV buffer, the board
/// history stack).
pub const MAX_DEPTH: Depth = 128;
