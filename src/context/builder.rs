//! A builder for a [`Context`].

use nonempty::NonEmpty;

use crate::Color;
use crate::context::Context;
use crate::context::Lattice;
use crate::context::SCAFFOLD_COLOR;
use crate::context::STAPLE_PALETTE;
use crate::context::SingleBaseCrossovers;

/// A builder for a [`Context`].
#[derive(Debug, Default)]
pub struct Builder {
    /// The lattice.
    lattice: Option<Lattice>,

    /// The staple palette.
    palette: Option<NonEmpty<Color>>,

    /// The scaffold color.
    scaffold_color: Option<Color>,

    /// The single-base crossover policy.
    single_base_crossovers: Option<SingleBaseCrossovers>,

    /// The default axis length.
    default_axis_length: Option<usize>,
}

impl Builder {
    /// Sets the lattice.
    pub fn lattice(mut self, lattice: Lattice) -> Self {
        self.lattice = Some(lattice);
        self
    }

    /// Sets the staple palette.
    ///
    /// # Examples
    ///
    /// ```
    /// use nonempty::nonempty;
    /// use strandgraph::Color;
    /// use strandgraph::context::Builder;
    ///
    /// let red = Color::rgb(0xff, 0, 0);
    /// let context = Builder::default().palette(nonempty![red]).build();
    /// assert_eq!(context.staple_color(7), red);
    /// ```
    pub fn palette(mut self, palette: NonEmpty<Color>) -> Self {
        self.palette = Some(palette);
        self
    }

    /// Sets the scaffold color.
    pub fn scaffold_color(mut self, color: Color) -> Self {
        self.scaffold_color = Some(color);
        self
    }

    /// Sets the single-base crossover policy.
    pub fn single_base_crossovers(mut self, policy: SingleBaseCrossovers) -> Self {
        self.single_base_crossovers = Some(policy);
        self
    }

    /// Sets the length of newly created axes.
    ///
    /// Zero-length axes cannot hold strands, so a length of zero is raised to
    /// one.
    pub fn default_axis_length(mut self, length: usize) -> Self {
        self.default_axis_length = Some(length.max(1));
        self
    }

    /// Consumes `self` to build a [`Context`].
    pub fn build(self) -> Context {
        let lattice = self.lattice.unwrap_or_default();

        let palette = self.palette.unwrap_or_else(|| {
            NonEmpty::from_slice(&STAPLE_PALETTE)
                .unwrap_or_else(|| unreachable!("the default palette is not empty"))
        });

        Context {
            lattice,
            palette,
            scaffold_color: self.scaffold_color.unwrap_or(SCAFFOLD_COLOR),
            single_base_crossovers: self.single_base_crossovers.unwrap_or_default(),
            default_axis_length: self
                .default_axis_length
                .unwrap_or_else(|| lattice.step() * 2),
        }
    }
}
