//! Decoder types

bitflags! {
    /// Options which influence the decoding of a bitstream.
    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    pub struct DecoderOption : u8 {
        /// Read custom quantizer matrices out of sequence headers and use
        /// them for reconstruction.
        ///
        /// Without this option the matrix bits of a sequence header that
        /// carries custom matrices are left in the stream, so the rest of
        /// the header is misread.
        const LOAD_QUANT_MATRICES = 0b1;

        /// Reconstruct motion vectors from their codes and the running
        /// predictors, following ISO/IEC 11172-2 2.4.4.2.
        ///
        /// This is experimental and has not been verified against a
        /// reference decoder. Either way, vectors are only recorded in the
        /// picture; prediction does not displace samples.
        const MOTION_VECTOR_RECONSTRUCTION = 0b10;
    }
}
