use crate::error::{Result, TensorError};

fn check_same_len(op: &str, x: &[f32], out: &[f32]) -> Result<()> {
    if x.len() != out.len() {
        return Err(TensorError::Other(format!(
            "{}: x.len()={} but out.len()={}",
            op,
            x.len(),
            out.len()
        )));
    }
    Ok(())
}

pub fn relu(x: &[f32], out: &mut [f32]) -> Result<()> {
    check_same_len("relu", x, out)?;
    for (o, &v) in out.iter_mut().zip(x) {
        *o = v.max(0.0);
    }
    Ok(())
}

pub fn sigmoid(x: &[f32], out: &mut [f32]) -> Result<()> {
    check_same_len("sigmoid", x, out)?;
    for (o, &v) in out.iter_mut().zip(x) {
        *o = 1.0 / (1.0 + (-v).exp());
    }
    Ok(())
}

pub fn tanh(x: &[f32], out: &mut [f32]) -> Result<()> {
    check_same_len("tanh", x, out)?;
    for (o, &v) in out.iter_mut().zip(x) {
        *o = v.tanh();
    }
    Ok(())
}

pub fn softmax(x: &[f32], out: &mut [f32], row_len: usize) -> Result<()> {
    check_same_len("softmax", x, out)?;
    if x.is_empty() {
        return Ok(());
    }
    if row_len == 0 {
        return Err(TensorError::Other(
            "softmax: row_len must be > 0".to_string(),
        ));
    }
    if x.len() % row_len != 0 {
        return Err(TensorError::Other(format!(
            "softmax: x.len()={} is not a multiple of row_len={}",
            x.len(),
            row_len
        )));
    }

    for (row, out_row) in x.chunks_exact(row_len).zip(out.chunks_exact_mut(row_len)) {
        // Subtract the row max so exp never overflows.
        let max_val = row.iter().copied().fold(f32::NEG_INFINITY, f32::max);

        let mut sum = 0.0f32;
        for (o, &v) in out_row.iter_mut().zip(row) {
            let e = (v - max_val).exp();
            *o = e;
            sum += e;
        }

        for o in out_row.iter_mut() {
            *o /= sum;
        }
    }
    Ok(())
}
