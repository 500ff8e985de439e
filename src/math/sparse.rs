use std::error::Error;
use std::fmt;

use ndarray::{Array1, Array2};
use num_traits::Zero;

/// Storage order of a [`SparseMatrix`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Layout {
    /// Compressed sparse rows: fast row access, produced by LF application.
    Csr,
    /// Compressed sparse columns: the layout handed to models.
    Csc,
}

/// Compressed sparse matrix holding only non-zero entries.
///
/// Entries inside each compressed slice are sorted by their inner index and
/// explicit zeros are never stored, so two matrices with the same layout and
/// the same values compare equal.
#[derive(Clone, Debug, PartialEq)]
pub struct SparseMatrix<T> {
    rows: usize,
    cols: usize,
    layout: Layout,
    indptr: Vec<usize>,
    indices: Vec<usize>,
    data: Vec<T>,
}

impl<T> SparseMatrix<T>
where
    T: Copy + Zero + PartialEq,
{
    /// All-zero matrix in row layout. `cols` may be 0, which is how a missing
    /// feature matrix is represented.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            layout: Layout::Csr,
            indptr: vec![0; rows + 1],
            indices: Vec::new(),
            data: Vec::new(),
        }
    }

    /// Build a row-major matrix from `(row, col, value)` triplets.
    ///
    /// Zero values are dropped; when a cell appears more than once the last
    /// triplet wins.
    pub fn from_triplets(
        shape: (usize, usize),
        triplets: Vec<(usize, usize, T)>,
    ) -> Result<Self, ShapeError> {
        Self::compress(shape, Layout::Csr, triplets)
    }

    pub fn from_dense(dense: &Array2<T>) -> Self {
        let (rows, cols) = dense.dim();
        let mut indptr = Vec::with_capacity(rows + 1);
        let mut indices = Vec::new();
        let mut data = Vec::new();
        indptr.push(0);
        for row in dense.rows() {
            for (col, &value) in row.iter().enumerate() {
                if !value.is_zero() {
                    indices.push(col);
                    data.push(value);
                }
            }
            indptr.push(indices.len());
        }
        Self {
            rows,
            cols,
            layout: Layout::Csr,
            indptr,
            indices,
            data,
        }
    }

    fn compress(
        shape: (usize, usize),
        layout: Layout,
        mut triplets: Vec<(usize, usize, T)>,
    ) -> Result<Self, ShapeError> {
        let (rows, cols) = shape;
        if let Some(&(r, c, _)) = triplets.iter().find(|&&(r, c, _)| r >= rows || c >= cols) {
            return Err(ShapeError::new("entry out of bounds", shape, (r, c)));
        }

        let key = |&(r, c, _): &(usize, usize, T)| match layout {
            Layout::Csr => (r, c),
            Layout::Csc => (c, r),
        };
        // Stable sort keeps insertion order among duplicates so the last one wins.
        triplets.sort_by_key(key);

        let n_outer = match layout {
            Layout::Csr => rows,
            Layout::Csc => cols,
        };
        let mut counts = vec![0usize; n_outer];
        let mut indices = Vec::with_capacity(triplets.len());
        let mut data = Vec::with_capacity(triplets.len());

        let mut i = 0;
        while i < triplets.len() {
            let (outer, inner) = key(&triplets[i]);
            let mut j = i;
            while j + 1 < triplets.len() && key(&triplets[j + 1]) == (outer, inner) {
                j += 1;
            }
            let value = triplets[j].2;
            if !value.is_zero() {
                counts[outer] += 1;
                indices.push(inner);
                data.push(value);
            }
            i = j + 1;
        }

        let mut indptr = Vec::with_capacity(n_outer + 1);
        indptr.push(0);
        for count in counts {
            let last = indptr[indptr.len() - 1];
            indptr.push(last + count);
        }

        Ok(Self {
            rows,
            cols,
            layout,
            indptr,
            indices,
            data,
        })
    }

    pub fn nrows(&self) -> usize {
        self.rows
    }

    pub fn ncols(&self) -> usize {
        self.cols
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Number of stored (non-zero) entries.
    pub fn nnz(&self) -> usize {
        self.data.len()
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    /// Value at `(row, col)`, zero when the cell is not stored.
    pub fn get(&self, row: usize, col: usize) -> T {
        assert!(
            row < self.rows && col < self.cols,
            "index ({}, {}) out of bounds for shape ({}, {})",
            row,
            col,
            self.rows,
            self.cols
        );
        let (outer, inner) = match self.layout {
            Layout::Csr => (row, col),
            Layout::Csc => (col, row),
        };
        let span = self.indptr[outer]..self.indptr[outer + 1];
        match self.indices[span.clone()].binary_search(&inner) {
            Ok(pos) => self.data[span.start + pos],
            Err(_) => T::zero(),
        }
    }

    /// Iterate stored entries as `(row, col, value)` in storage order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, T)> + '_ {
        self.indptr.windows(2).enumerate().flat_map(move |(outer, w)| {
            (w[0]..w[1]).map(move |k| {
                let inner = self.indices[k];
                match self.layout {
                    Layout::Csr => (outer, inner, self.data[k]),
                    Layout::Csc => (inner, outer, self.data[k]),
                }
            })
        })
    }

    fn to_layout(&self, layout: Layout) -> Self {
        if self.layout == layout {
            return self.clone();
        }
        let triplets = self.iter().collect();
        // Every stored entry is in bounds, so compression cannot fail.
        Self::compress(self.shape(), layout, triplets)
            .unwrap_or_else(|err| unreachable!("re-compressing a valid matrix: {}", err))
    }

    pub fn to_csr(&self) -> Self {
        self.to_layout(Layout::Csr)
    }

    pub fn to_csc(&self) -> Self {
        self.to_layout(Layout::Csc)
    }

    /// Apply `f` to every stored entry, keeping the layout. Entries mapped to
    /// zero are dropped.
    pub fn mapv<U, F>(&self, mut f: F) -> SparseMatrix<U>
    where
        U: Copy + Zero + PartialEq,
        F: FnMut(T) -> U,
    {
        let mut indptr = Vec::with_capacity(self.indptr.len());
        let mut indices = Vec::with_capacity(self.indices.len());
        let mut data = Vec::with_capacity(self.data.len());
        indptr.push(0);
        for w in self.indptr.windows(2) {
            for k in w[0]..w[1] {
                let value = f(self.data[k]);
                if !value.is_zero() {
                    indices.push(self.indices[k]);
                    data.push(value);
                }
            }
            indptr.push(indices.len());
        }
        SparseMatrix {
            rows: self.rows,
            cols: self.cols,
            layout: self.layout,
            indptr,
            indices,
            data,
        }
    }

    /// Horizontally concatenate `blocks`, which must all have the same number
    /// of rows. The result is stored in `layout`.
    pub fn hstack(blocks: &[&SparseMatrix<T>], layout: Layout) -> Result<Self, ShapeError> {
        let rows = match blocks.first() {
            Some(first) => first.rows,
            None => return Ok(Self::zeros(0, 0).to_layout(layout)),
        };
        let mut triplets = Vec::with_capacity(blocks.iter().map(|b| b.nnz()).sum());
        let mut offset = 0;
        for block in blocks {
            if block.rows != rows {
                return Err(ShapeError::new(
                    "hstack row mismatch",
                    (rows, block.cols),
                    block.shape(),
                ));
            }
            triplets.extend(block.iter().map(|(r, c, v)| (r, c + offset, v)));
            offset += block.cols;
        }
        Self::compress((rows, offset), layout, triplets)
    }

    pub fn to_dense(&self) -> Array2<T> {
        let mut dense = Array2::from_elem((self.rows, self.cols), T::zero());
        for (r, c, v) in self.iter() {
            dense[[r, c]] = v;
        }
        dense
    }
}

impl SparseMatrix<f64> {
    /// Matrix-vector product `X w`.
    pub fn dot(&self, w: &Array1<f64>) -> Result<Array1<f64>, ShapeError> {
        if w.len() != self.cols {
            return Err(ShapeError::new("dot", (self.cols, 1), (w.len(), 1)));
        }
        let mut out = Array1::zeros(self.rows);
        for (r, c, v) in self.iter() {
            out[r] += v * w[c];
        }
        Ok(out)
    }

    /// Transposed product `Xᵀ v`.
    pub fn t_dot(&self, v: &Array1<f64>) -> Result<Array1<f64>, ShapeError> {
        if v.len() != self.rows {
            return Err(ShapeError::new("t_dot", (self.rows, 1), (v.len(), 1)));
        }
        let mut out = Array1::zeros(self.cols);
        for (r, c, x) in self.iter() {
            out[c] += x * v[r];
        }
        Ok(out)
    }

    pub fn abs(&self) -> SparseMatrix<f64> {
        self.mapv(f64::abs)
    }
}

impl SparseMatrix<i8> {
    /// Widen a label matrix to the floating point input models consume.
    pub fn to_f64(&self) -> SparseMatrix<f64> {
        self.mapv(f64::from)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapeError {
    op: &'static str,
    expected: (usize, usize),
    found: (usize, usize),
}

impl ShapeError {
    pub fn new(op: &'static str, expected: (usize, usize), found: (usize, usize)) -> Self {
        Self { op, expected, found }
    }
}

impl fmt::Display for ShapeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: expected {:?}, found {:?}",
            self.op, self.expected, self.found
        )
    }
}

impl Error for ShapeError {}
