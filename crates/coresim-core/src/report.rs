//! Plain-text report rendering: header block, per-core blocks, and a final
//! cross-core block.

use coresim_cache::CacheGeometry;

use crate::counters::GlobalCounters;
use crate::scheduler::SimulationResult;

/// A finished simulation, ready to render as the plain-text output file.
#[derive(Debug, Clone)]
pub struct Report<'a> {
    trace_prefix: &'a str,
    result: &'a SimulationResult,
}

impl<'a> Report<'a> {
    /// Wrap a finished simulation for rendering, labeling it with the trace
    /// prefix the caches were run against (echoed in the header block).
    #[must_use]
    pub const fn new(trace_prefix: &'a str, result: &'a SimulationResult) -> Self {
        Self { trace_prefix, result }
    }

    /// Render the full report: a header block, one block per core, and a
    /// final cross-core block.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.render_header(&mut out, self.result.geometry);
        for (core, cache) in self.result.caches.iter().enumerate() {
            render_core_block(&mut out, core, cache.counters());
        }
        render_final_block(&mut out, &self.result.global);
        out
    }

    fn render_header(&self, out: &mut String, geometry: CacheGeometry) {
        let cache_size_kb = f64::from(geometry.total_size_bytes()) / 1024.0;
        out.push_str(&format!("Trace prefix: {}\n", self.trace_prefix));
        out.push_str(&format!("Set index bits: {}\n", geometry.set_index_bits()));
        out.push_str(&format!("Associativity: {}\n", geometry.assoc));
        out.push_str(&format!("Block bits: {}\n", geometry.block_offset_bits()));
        out.push_str(&format!("Block size (bytes): {}\n", geometry.block_size_bytes));
        out.push_str(&format!("Number of sets: {}\n", geometry.num_sets));
        out.push_str(&format!("Cache size per core (KB): {cache_size_kb:.2}\n"));
        out.push_str("Coherence: MESI\n");
        out.push_str("Write policy: write-back, write-allocate\n");
        out.push_str("Replacement policy: LRU\n");
        out.push_str("Bus: snooping\n");
        out.push('\n');
    }
}

fn render_core_block(out: &mut String, core: usize, counters: &coresim_cache::CacheCounters) {
    out.push_str(&format!("Core {core}:\n"));
    out.push_str(&format!("Total instructions: {}\n", counters.total_instructions()));
    out.push_str(&format!("Reads: {}\n", counters.reads));
    out.push_str(&format!("Writes: {}\n", counters.writes));
    out.push_str(&format!("Total execution cycles: {}\n", counters.execution_cycles()));
    out.push_str(&format!("Idle cycles: {}\n", counters.idle_cycles));
    out.push_str(&format!("Cache misses: {}\n", counters.misses));
    out.push_str(&format!("Miss rate (%): {:.5}\n", counters.miss_rate() * 100.0));
    out.push_str(&format!("Evictions: {}\n", counters.evictions));
    out.push_str(&format!("Writebacks: {}\n", counters.writebacks));
    out.push_str(&format!("Bus invalidations: {}\n", counters.invalidations));
    out.push_str(&format!("Data traffic (bytes): {}\n", counters.data_traffic));
    out.push('\n');
}

fn render_final_block(out: &mut String, global: &GlobalCounters) {
    out.push_str("Overall:\n");
    out.push_str(&format!("Bus transactions: {}\n", global.bus_transactions));
    out.push_str(&format!("Bus traffic (bytes): {}\n", global.bus_data_traffic));
    out.push_str(&format!("Maximum execution time (cycles): {}\n", global.total_cycles));
}
