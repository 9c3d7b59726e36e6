use tantivy::schema::{Field, IndexRecordOption, Schema, TextFieldIndexing, TextOptions, STORED, STRING};
use tantivy::tokenizer::{Language, LowerCaser, SimpleTokenizer, Stemmer, StopWordFilter, TextAnalyzer};
use tantivy::Index;

pub const TOKENIZER_NAME: &str = "text_with_stopwords";

pub const STOP_WORDS: &[&str] = &[
	"a","an","and","are","as","at","be","by","for","from","has","he","in","is","it","its","of","on","that","the","to","was","will","with","or","but","not","this","these","they","them","their","there","then","than","so","if","when","where","why","how","what","which","who","whom","whose","can","could","should","would","may","might","must","shall","do","does","did","have","had","having",
];

/// `id` is an exact-match stored key; `text` is tokenized and not stored,
/// since content lives in the document table.
#[derive(Debug, Clone, Copy)]
pub struct KeywordFields {
	pub id: Field,
	pub text: Field,
}

pub fn build_schema() -> (Schema, KeywordFields) {
	let mut schema_builder = Schema::builder();
	let id = schema_builder.add_text_field("id", STRING | STORED);
	let text_field_indexing = TextFieldIndexing::default().set_tokenizer(TOKENIZER_NAME).set_index_option(IndexRecordOption::WithFreqsAndPositions);
	let text = schema_builder.add_text_field("text", TextOptions::default().set_indexing_options(text_field_indexing));
	(schema_builder.build(), KeywordFields { id, text })
}

/// Lower-case, drop stop words, then Snowball English stemming, so indexed
/// text and stemmed queries meet on the same terms.
pub fn analyzer() -> TextAnalyzer {
	TextAnalyzer::builder(SimpleTokenizer::default())
		.filter(LowerCaser)
		.filter(StopWordFilter::remove(STOP_WORDS.iter().map(|s| s.to_string())))
		.filter(Stemmer::new(Language::English))
		.build()
}

/// RAM index with the stop-word analyzer registered.
pub fn open_ram_index() -> (Index, KeywordFields) {
	let (schema, fields) = build_schema();
	let index = Index::create_in_ram(schema);
	index.tokenizers().register(TOKENIZER_NAME, analyzer());
	(index, fields)
}

#[cfg(test)]
mod tests {
	use super::*;
	use tantivy::tokenizer::TokenStream;

	#[test]
	fn analyzer_drops_stop_words_and_stems() {
		let mut analyzer = analyzer();
		let mut stream = analyzer.token_stream("What is the Shipping Policy");
		let mut tokens = Vec::new();
		while stream.advance() {
			tokens.push(stream.token().text.clone());
		}
		assert_eq!(tokens, ["ship", "polici"]);
	}
}
