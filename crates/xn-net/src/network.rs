use std::fmt::Write as _;
use std::fs::File;
use std::io::{BufWriter, Cursor, Read, Write};
use std::path::Path;
use std::sync::Arc;

use memmap2::Mmap;

use xn_tensor::{ComputeBackend, CpuBackend, Matrix};

use crate::error::{ModelError, Result};
use crate::node::Node;
use crate::proto::{NetMeta, NetProto};

/// An ordered stack of layers evaluated one after another.
///
/// Intermediate results live in a pool of `len() - 1` buffers owned by the
/// network. The pool is rebuilt only when the layer count changes; between
/// calls the buffers are resized in place, which is free when the element
/// count stays the same.
///
/// `forward` mutates the pool and the quantized layers' scratch buffers, so
/// one instance serves one caller at a time. Use separate instances for
/// parallel inference.
#[derive(Debug)]
pub struct Network {
    meta: NetMeta,
    nodes: Vec<Node>,
    pool: Vec<Matrix<'static, f32>>,
    backend: Arc<dyn ComputeBackend>,
}

impl Default for Network {
    fn default() -> Self {
        Self::new()
    }
}

impl Network {
    /// An empty network on the CPU backend.
    pub fn new() -> Self {
        Self::with_backend(Arc::new(CpuBackend::new()))
    }

    pub fn with_backend(backend: Arc<dyn ComputeBackend>) -> Self {
        Network {
            meta: NetMeta::default(),
            nodes: Vec::new(),
            pool: Vec::new(),
            backend,
        }
    }

    pub fn meta(&self) -> &NetMeta {
        &self.meta
    }

    pub fn set_meta(&mut self, meta: NetMeta) {
        self.meta = meta;
    }

    pub fn backend(&self) -> &dyn ComputeBackend {
        self.backend.as_ref()
    }

    /// Append a layer; it is evaluated after all layers already present.
    pub fn push(&mut self, node: impl Into<Node>) {
        self.nodes.push(node.into());
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Drop every layer and intermediate buffer.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.pool.clear();
    }

    /// Number of intermediate buffers currently held.
    pub fn pool_len(&self) -> usize {
        self.pool.len()
    }

    fn ensure_pool(&mut self, required: usize) {
        if self.pool.len() != required {
            tracing::debug!(
                "reallocating buffer pool: {} -> {} buffers",
                self.pool.len(),
                required
            );
            self.pool = (0..required).map(|_| Matrix::default()).collect();
        }
    }

    /// Run `input` (`[batch, features]`) through every layer in order and
    /// write the last layer's result to `output`.
    ///
    /// # Errors
    /// [`ModelError::EmptyNetwork`] when there are no layers, or the first
    /// shape error raised by a layer.
    pub fn forward(&mut self, input: &Matrix<'_, f32>, output: &mut Matrix<'_, f32>) -> Result<()> {
        let n = self.nodes.len();
        if n == 0 {
            return Err(ModelError::EmptyNetwork);
        }
        self.ensure_pool(n - 1);

        let backend = self.backend.as_ref();
        let nodes = &mut self.nodes;
        let pool = &mut self.pool;

        if n == 1 {
            return nodes[0].forward(input, output, backend);
        }

        nodes[0].forward(input, &mut pool[0], backend)?;
        for i in 1..n - 1 {
            let (done, rest) = pool.split_at_mut(i);
            nodes[i].forward(&done[i - 1], &mut rest[0], backend)?;
        }
        nodes[n - 1].forward(&pool[n - 2], output, backend)
    }

    /// Replace `target`'s layers with the quantized counterparts of this
    /// network's layers, in the same order. Metadata is copied along.
    pub fn quantize_into(&self, target: &mut Network) -> Result<()> {
        let nodes = self
            .nodes
            .iter()
            .map(Node::quantize)
            .collect::<Result<Vec<_>>>()?;
        target.clear();
        target.nodes = nodes;
        target.meta = self.meta.clone();
        tracing::info!("quantized network with {} layers", target.nodes.len());
        Ok(())
    }

    /// A quantized copy sharing this network's backend.
    pub fn quantize(&self) -> Result<Network> {
        let mut target = Network::with_backend(Arc::clone(&self.backend));
        self.quantize_into(&mut target)?;
        Ok(target)
    }

    /// Human-readable dump, one line per layer.
    pub fn info(&self) -> String {
        let mut out = String::new();
        for node in &self.nodes {
            let _ = writeln!(out, "{}", node);
        }
        out
    }

    pub fn to_proto(&self) -> NetProto {
        NetProto {
            meta: self.meta.clone(),
            nodes: self.nodes.iter().map(Node::to_proto).collect(),
        }
    }

    /// Replace all layers and metadata with those described by `proto`.
    ///
    /// Every layer is rebuilt before anything is replaced, so on error the
    /// network is left as it was.
    pub fn load_proto(&mut self, proto: &NetProto) -> Result<()> {
        let nodes = proto
            .nodes
            .iter()
            .map(Node::from_proto)
            .collect::<Result<Vec<_>>>()?;
        self.clear();
        self.nodes = nodes;
        self.meta = proto.meta.clone();
        Ok(())
    }

    /// Parse a model from `reader`, replacing the current layers.
    pub fn read_from(&mut self, reader: &mut impl Read) -> Result<()> {
        let proto = NetProto::read(reader)?;
        self.load_proto(&proto)?;
        tracing::info!(
            "loaded network: {} layers, version {}",
            self.nodes.len(),
            self.meta.version
        );
        Ok(())
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Network> {
        let mut net = Network::new();
        net.read_from(&mut Cursor::new(bytes))?;
        Ok(net)
    }

    /// Load a model file through a read-only memory map.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Network> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let mmap = unsafe { Mmap::map(&file)? };
        tracing::info!("reading model from {} ({} bytes)", path.display(), mmap.len());
        Network::from_bytes(&mmap)
    }

    pub fn write_to(&self, writer: &mut impl Write) -> Result<()> {
        self.to_proto().write(writer)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.write_to(&mut buf)?;
        Ok(buf)
    }

    pub fn to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let mut writer = BufWriter::new(File::create(path)?);
        self.write_to(&mut writer)?;
        writer.flush()?;
        tracing::info!("wrote {} layers to {}", self.nodes.len(), path.display());
        Ok(())
    }
}
