#[cfg(test)]
mod roundtrip_tests {
    use lepton_encoder::encode::model::position::BlockPosition;
    use lepton_encoder::encode::observer::{BlockSite, ContextObserver};
    use lepton_encoder::{
        AnnotationWriter, Channel, CoefficientBlock, ComponentInfo, EncoderOptions, LeptonError, Model,
        QuantizationTable, SwitchableWriter, UncompressedComponents, Vp8ComponentDecoder, Vp8ComponentEncoder,
    };
    use tempfile::TempDir;

    /// Small LCG so the synthetic images are reproducible.
    struct Lcg(u64);

    impl Lcg {
        fn next(&mut self) -> u32 {
            self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            (self.0 >> 33) as u32
        }

        fn range(&mut self, n: u32) -> i16 {
            (self.next() % (2 * n + 1)) as i16 - n as i16
        }
    }

    /// A block shaped like real JPEG data: a smooth DC, a few low-frequency
    /// terms and an occasional stray high-frequency coefficient.
    fn synthetic_block(rng: &mut Lcg, dc: i16) -> CoefficientBlock {
        let mut zigzag = [0i16; 64];
        zigzag[0] = dc;
        for zz in 1..64 {
            let roll = rng.next() % 100;
            let limit = if zz < 6 { 60 } else if zz < 20 { 25 } else { 4 };
            if roll < limit {
                let scale = (64 - zz as u32) / 4 + 1;
                zigzag[zz] = rng.range(scale);
            }
        }
        CoefficientBlock::from_zigzag(zigzag)
    }

    fn synthetic_channel(rng: &mut Lcg, width: usize, height: usize, step: u16) -> (ComponentInfo, Vec<CoefficientBlock>) {
        let mut blocks = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                let dc = ((x * 7 + y * 3) % 90) as i16 - 45 + rng.range(3);
                blocks.push(synthetic_block(rng, dc));
            }
        }
        (ComponentInfo::new(width, height, QuantizationTable::flat(step)), blocks)
    }

    fn encode(store: &UncompressedComponents, options: EncoderOptions) -> Vec<u8> {
        let mut sink = SwitchableWriter::new(Vec::new());
        Vp8ComponentEncoder::new(options)
            .encode_chunk(store, &mut sink)
            .expect("encoding failed");
        sink.into_inner()
    }

    fn assert_roundtrip(store: &UncompressedComponents) -> usize {
        let bytes = encode(store, EncoderOptions::new());
        let decoded = Vp8ComponentDecoder::new()
            .decode_chunk(&mut bytes.as_slice(), store.layout())
            .expect("decoding failed");
        assert!(decoded.is_complete());
        assert_eq!(&decoded, store);
        bytes.len()
    }

    #[test]
    fn test_color_image_with_subsampled_chroma() {
        let mut rng = Lcg(7);
        let store = UncompressedComponents::from_blocks(vec![
            synthetic_channel(&mut rng, 8, 6, 2),
            synthetic_channel(&mut rng, 4, 3, 3),
            synthetic_channel(&mut rng, 4, 3, 3),
        ])
        .unwrap();
        let size = assert_roundtrip(&store);
        println!("3 channel image: {} bytes", size);
    }

    #[test]
    fn test_grayscale_image() {
        let mut rng = Lcg(11);
        let store = UncompressedComponents::from_blocks(vec![synthetic_channel(&mut rng, 10, 10, 1)]).unwrap();
        assert_roundtrip(&store);
    }

    #[test]
    fn test_single_column_and_single_block_images() {
        let mut rng = Lcg(3);
        let column = UncompressedComponents::from_blocks(vec![synthetic_channel(&mut rng, 1, 9, 4)]).unwrap();
        assert_roundtrip(&column);
        let single = UncompressedComponents::from_blocks(vec![synthetic_channel(&mut rng, 1, 1, 4)]).unwrap();
        assert_roundtrip(&single);
        let row = UncompressedComponents::from_blocks(vec![synthetic_channel(&mut rng, 9, 1, 4)]).unwrap();
        assert_roundtrip(&row);
    }

    #[test]
    fn test_zero_width_channel_contributes_no_blocks() {
        let mut rng = Lcg(13);
        let empty = (ComponentInfo::new(0, 3, QuantizationTable::flat(1)), Vec::new());
        let store = UncompressedComponents::from_blocks(vec![synthetic_channel(&mut rng, 2, 2, 1), empty]).unwrap();
        assert_roundtrip(&store);
        assert!(store.blocks(Channel::Cb).is_empty());
    }

    #[test]
    fn test_extreme_coefficients() {
        let mut zigzag = [0i16; 64];
        zigzag[0] = i16::MIN;
        zigzag[1] = i16::MAX;
        zigzag[2] = i16::MIN;
        zigzag[4] = i16::MIN;
        zigzag[63] = i16::MAX;
        let extreme = CoefficientBlock::from_zigzag(zigzag);
        let mut flipped = zigzag;
        flipped[0] = i16::MAX;
        let info = ComponentInfo::new(2, 2, QuantizationTable::flat(1));
        let blocks = vec![extreme.clone(), CoefficientBlock::from_zigzag(flipped), extreme, CoefficientBlock::zeroed()];
        let store = UncompressedComponents::from_blocks(vec![(info, blocks)]).unwrap();
        assert_roundtrip(&store);
    }

    #[test]
    fn test_smooth_image_compresses() {
        let info = ComponentInfo::new(16, 16, QuantizationTable::flat(8));
        let blocks = (0..256)
            .map(|i| {
                let mut zz = [0i16; 64];
                zz[0] = 40;
                zz[1] = (i % 2) as i16;
                CoefficientBlock::from_zigzag(zz)
            })
            .collect();
        let store = UncompressedComponents::from_blocks(vec![(info, blocks)]).unwrap();
        let size = assert_roundtrip(&store);
        // 256 blocks of 128 raw bytes each
        assert!(size < 256 * 128 / 20, "poor compression: {} bytes", size);
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let mut rng = Lcg(5);
        let store = UncompressedComponents::from_blocks(vec![
            synthetic_channel(&mut rng, 6, 4, 2),
            synthetic_channel(&mut rng, 3, 2, 2),
        ])
        .unwrap();
        assert_eq!(encode(&store, EncoderOptions::new()), encode(&store, EncoderOptions::new()));
    }

    #[test]
    fn test_warm_start_from_exported_model() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let model_path = temp_dir.path().join("model.bin");

        let mut rng = Lcg(21);
        let training = UncompressedComponents::from_blocks(vec![synthetic_channel(&mut rng, 12, 12, 2)]).unwrap();
        encode(&training, EncoderOptions::new().with_model_export(&model_path));

        let bytes = std::fs::read(&model_path).unwrap();
        let model = Model::load(&mut bytes.as_slice()).unwrap();

        let store = UncompressedComponents::from_blocks(vec![
            synthetic_channel(&mut rng, 6, 6, 2),
            synthetic_channel(&mut rng, 3, 3, 2),
        ])
        .unwrap();
        let warm = encode(&store, EncoderOptions::new().with_initial_model(model.clone()));
        let decoded = Vp8ComponentDecoder::new()
            .with_initial_model(model)
            .decode_chunk(&mut warm.as_slice(), store.layout())
            .unwrap();
        assert_eq!(decoded, store);

        // a cold decoder cannot follow a warm-started stream
        let cold = Vp8ComponentDecoder::new().decode_chunk(&mut warm.as_slice(), store.layout());
        assert!(cold.map_or(true, |d| d != store));
    }

    #[test]
    fn test_export_into_missing_directory() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let mut rng = Lcg(1);
        let store = UncompressedComponents::from_blocks(vec![synthetic_channel(&mut rng, 2, 2, 1)]).unwrap();
        let mut sink = SwitchableWriter::new(Vec::new());
        let result = Vp8ComponentEncoder::new(
            EncoderOptions::new().with_model_export(temp_dir.path().join("no_such_dir").join("model.bin")),
        )
        .encode_chunk(&store, &mut sink);
        assert!(matches!(result, Err(LeptonError::ModelExport { .. })));
        assert_eq!(sink.raw_bytes() + sink.compressed_bytes(), 0);
    }

    struct PositionCounter([[usize; BlockPosition::COUNT]; Channel::COUNT]);

    impl ContextObserver for PositionCounter {
        fn begin_block(&mut self, site: &BlockSite) {
            self.0[site.channel.index()][site.position.index()] += 1;
        }
    }

    #[test]
    fn test_every_block_visited_once_with_expected_positions() {
        let mut rng = Lcg(9);
        let store = UncompressedComponents::from_blocks(vec![
            synthetic_channel(&mut rng, 4, 3, 1),
            synthetic_channel(&mut rng, 1, 2, 1),
        ])
        .unwrap();
        let mut encoder =
            Vp8ComponentEncoder::with_observer(EncoderOptions::new(), PositionCounter([[0; BlockPosition::COUNT]; Channel::COUNT]));
        encoder
            .encode_chunk(&store, &mut SwitchableWriter::new(Vec::new()))
            .unwrap();
        let counts = encoder.into_observer().0;

        use BlockPosition::*;
        let y = counts[Channel::Y.index()];
        assert_eq!(y[Corner.index()], 1);
        assert_eq!(y[TopEdge.index()], 3);
        assert_eq!(y[MidLeft.index()], 2);
        assert_eq!(y[Middle.index()], 4);
        assert_eq!(y[MidRight.index()], 2);
        let cb = counts[Channel::Cb.index()];
        assert_eq!(cb[Corner.index()], 1);
        assert_eq!(cb[SingleColumn.index()], 1);
        assert_eq!(y.iter().sum::<usize>() + cb.iter().sum::<usize>(), 14);
    }

    #[test]
    fn test_annotation_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("annotations.txt");
        let file = std::fs::File::create(&path).unwrap();

        let mut rng = Lcg(2);
        let store = UncompressedComponents::from_blocks(vec![synthetic_channel(&mut rng, 2, 1, 1)]).unwrap();
        let mut encoder = Vp8ComponentEncoder::with_observer(EncoderOptions::new(), AnnotationWriter::new(file));
        encoder
            .encode_chunk(&store, &mut SwitchableWriter::new(Vec::new()))
            .unwrap();
        encoder.into_observer().finish().unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.lines().next().unwrap().starts_with("col[00] y[00]x[00] corner len="));
        assert!(text.contains("col[00] y[00]x[01] top len="));
        assert!(text.contains("[EXPDC]"));
    }
}
